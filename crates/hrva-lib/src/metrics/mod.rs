//! Feature extraction over cleaned NN intervals.

pub mod features;
pub mod frequency;
pub mod geometric;
pub mod nonlinear;
pub mod resample;
pub mod spectral;
pub mod sqi;
pub mod time;

pub use features::{
    extract_features, hrv_pipeline, FeatureGroup, FeatureMap, FeatureReport, HrvAnalysis,
};
pub use frequency::{band_powers, hrv_psd, power_spectrum, HrvFrequency};
pub use geometric::{hrv_geometric, HrvGeometric};
pub use nonlinear::{hrv_nonlinear, sample_entropy, HrvNonlinear};
pub use spectral::{LombScargle, Psd, SpectralEstimator, Welch};
pub use sqi::SampleQuality;
pub use time::{hrv_time, HrvTime};
