use crate::{config::QualityConfig, detectors::CleaningReport};
use serde::{Deserialize, Serialize};

/// Usability verdict for one cleaned recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleQuality {
    /// Fraction of raw intervals rejected by the filter.
    pub removed_ratio: f64,
    /// Length of the cleaned NN series.
    pub beats: usize,
    pub acceptable: bool,
}

impl SampleQuality {
    /// Too many rejected intervals or too few beats make a recording unusable.
    pub fn assess(report: &CleaningReport, cfg: &QualityConfig) -> Self {
        let removed_ratio = report.removed_ratio();
        let beats = report.nn.len();
        let acceptable = removed_ratio <= cfg.max_outlier_ratio && beats >= cfg.min_beats;
        if !acceptable {
            log::warn!(
                "recording flagged: {:.1}% intervals removed (max {:.1}%), {beats} beats (min {})",
                100.0 * removed_ratio,
                100.0 * cfg.max_outlier_ratio,
                cfg.min_beats
            );
        }
        Self {
            removed_ratio,
            beats,
            acceptable,
        }
    }

    pub fn is_acceptable(&self) -> bool {
        self.acceptable
    }
}
