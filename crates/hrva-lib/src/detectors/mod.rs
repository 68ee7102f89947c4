//! Artifact and ectopic-beat filtering of raw RR intervals.

pub mod ectopic;
pub mod interpolate;
pub mod outliers;
pub mod pipeline;

pub use ectopic::{
    is_outlier, remove_ectopic_beats, remove_outlier_karlsson, remove_outlier_mean_last9,
    EctopicRule,
};
pub use interpolate::interpolate_nan_values;
pub use outliers::{is_valid_sample, remove_outlier, remove_outlier_masked};
pub use pipeline::{clean_rr_intervals, get_nn_intervals, CleaningReport};
