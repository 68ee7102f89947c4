use crate::signal::MaskedRR;

/// Absolute physiological range test, both bounds inclusive.
///
/// 300 ms ≈ 200 bpm and 2000 ms ≈ 30 bpm are the usual limits.
pub fn is_valid_sample(value: f64, low: f64, high: f64) -> bool {
    low <= value && value <= high
}

/// Masks every interval outside `[low, high]`; positions are preserved.
pub fn remove_outlier(rr: &[f64], low: f64, high: f64) -> MaskedRR {
    remove_outlier_masked(&MaskedRR::from(rr), low, high)
}

/// Range masking over an already masked sequence.
pub fn remove_outlier_masked(series: &MaskedRR, low: f64, high: f64) -> MaskedRR {
    let samples: Vec<Option<f64>> = series
        .samples
        .iter()
        .map(|s| s.filter(|&v| is_valid_sample(v, low, high)))
        .collect();
    let out = MaskedRR { samples };
    let removed = out.missing_count().saturating_sub(series.missing_count());
    if removed > 0 {
        let values: Vec<f64> = series
            .samples
            .iter()
            .zip(&out.samples)
            .filter_map(|(before, after)| match (before, after) {
                (Some(v), None) => Some(*v),
                _ => None,
            })
            .collect();
        log::info!("{removed} outlier(s) outside [{low}, {high}] ms removed: {values:?}");
    } else {
        log::debug!("no interval outside [{low}, {high}] ms");
    }
    out
}
