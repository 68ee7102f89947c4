use crate::{
    config::FilterConfig,
    detectors::{
        ectopic::remove_ectopic_beats, interpolate::interpolate_nan_values,
        outliers::remove_outlier,
    },
    error::{HrvError, Result},
    signal::{MaskedRR, RRSeries},
};
use serde::{Deserialize, Serialize};

/// Everything the cleaning pipeline produced for one recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Number of raw intervals.
    pub raw_len: usize,
    /// Intervals outside the physiological range.
    pub range_outliers: usize,
    /// Intervals rejected by the ectopic rule.
    pub ectopic_beats: usize,
    /// Method used for ectopic detection.
    pub method: String,
    /// Mask after range and ectopic filtering, before interpolation.
    pub masked: MaskedRR,
    /// Interpolated NN intervals, same length as the raw input.
    pub nn: RRSeries,
}

impl CleaningReport {
    pub fn removed(&self) -> usize {
        self.range_outliers + self.ectopic_beats
    }

    pub fn removed_ratio(&self) -> f64 {
        if self.raw_len == 0 {
            0.0
        } else {
            self.removed() as f64 / self.raw_len as f64
        }
    }
}

/// Range filter → ectopic filter → interpolation, keeping intermediate results.
pub fn clean_rr_intervals(rr: &[f64], cfg: &FilterConfig) -> Result<CleaningReport> {
    if rr.is_empty() {
        return Err(HrvError::invalid("raw interval sequence is empty"));
    }
    if let Some(idx) = rr.iter().position(|v| !v.is_finite()) {
        return Err(HrvError::invalid(format!(
            "raw interval {idx} is not finite ({})",
            rr[idx]
        )));
    }
    cfg.validate()?;

    let ranged = remove_outlier(rr, cfg.low_rri, cfg.high_rri);
    let range_outliers = ranged.missing_count();
    let masked = remove_ectopic_beats(&ranged, &cfg.ectopic);
    let ectopic_beats = masked.missing_count() - range_outliers;
    let nn = interpolate_nan_values(&masked, cfg.interpolation)?;
    log::debug!(
        "cleaned {} intervals: {} out of range, {} ectopic",
        rr.len(),
        range_outliers,
        ectopic_beats
    );

    Ok(CleaningReport {
        raw_len: rr.len(),
        range_outliers,
        ectopic_beats,
        method: cfg.ectopic.to_string(),
        masked,
        nn,
    })
}

/// Computes NN intervals from raw RR intervals.
///
/// The result has the input's length with every rejected position interpolated.
pub fn get_nn_intervals(rr: &[f64], cfg: &FilterConfig) -> Result<RRSeries> {
    clean_rr_intervals(rr, cfg).map(|report| report.nn)
}
