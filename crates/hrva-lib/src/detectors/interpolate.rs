use crate::config::GapInterpolation;
use crate::error::{HrvError, Result};
use crate::signal::{MaskedRR, RRSeries};

/// Fills missing positions.
///
/// Runs between two present values are filled linearly; runs at either end take
/// the nearest present value. Sequences with nothing missing come back unchanged.
pub fn interpolate_nan_values(series: &MaskedRR, method: GapInterpolation) -> Result<RRSeries> {
    if series.is_empty() {
        return Err(HrvError::invalid("cannot interpolate an empty sequence"));
    }
    if let Some(complete) = series.to_complete() {
        return Ok(complete);
    }
    match method {
        GapInterpolation::Linear => linear_fill(&series.samples),
    }
}

fn linear_fill(samples: &[Option<f64>]) -> Result<RRSeries> {
    let anchors: Vec<(usize, f64)> = samples
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.map(|v| (i, v)))
        .collect();
    let (Some(&(first_idx, first_val)), Some(&(last_idx, last_val))) =
        (anchors.first(), anchors.last())
    else {
        return Err(HrvError::AllMissing);
    };

    let mut out = Vec::with_capacity(samples.len());
    let mut seg = 0;
    for (i, sample) in samples.iter().enumerate() {
        let value = match sample {
            Some(v) => *v,
            None if i < first_idx => first_val,
            None if i > last_idx => last_val,
            None => {
                while anchors[seg + 1].0 < i {
                    seg += 1;
                }
                let (x0, y0) = anchors[seg];
                let (x1, y1) = anchors[seg + 1];
                y0 + (y1 - y0) * (i - x0) as f64 / (x1 - x0) as f64
            }
        };
        out.push(value);
    }
    Ok(RRSeries::new(out))
}
