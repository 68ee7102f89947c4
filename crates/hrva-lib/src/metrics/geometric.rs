use crate::{
    config::GeometricConfig,
    error::{HrvError, Result},
    signal::RRSeries,
    stats::min_max,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvGeometric {
    pub triangular_index: f64,
    /// Base width (ms) of the triangle fitted to the NN histogram.
    pub tinn: f64,
}

impl HrvGeometric {
    pub const KEYS: [&'static str; 2] = ["triangular_index", "tinn"];

    pub fn entries(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("triangular_index", Some(self.triangular_index)),
            ("tinn", Some(self.tinn)),
        ]
    }
}

/// Fixed-width histogram of NN intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Left edge of the first bin.
    pub anchor: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bins anchored at `floor(min / width) * width`.
    pub fn new(values: &[f64], bin_width: f64) -> Option<Self> {
        let (lo, hi) = min_max(values)?;
        let anchor = (lo / bin_width).floor() * bin_width;
        let bins = ((hi - anchor) / bin_width).floor() as usize + 1;
        let mut counts = vec![0usize; bins];
        for v in values {
            let idx = (((v - anchor) / bin_width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Some(Self {
            anchor,
            bin_width,
            counts,
        })
    }

    pub fn edge(&self, i: usize) -> f64 {
        self.anchor + i as f64 * self.bin_width
    }

    pub fn centre(&self, i: usize) -> f64 {
        self.edge(i) + 0.5 * self.bin_width
    }

    /// Index and height of the tallest bin (first one on ties).
    pub fn peak(&self) -> (usize, usize) {
        self.counts
            .iter()
            .enumerate()
            .fold((0, 0), |best, (i, &c)| if c > best.1 { (i, c) } else { best })
    }
}

pub fn hrv_geometric(nn: &RRSeries, cfg: &GeometricConfig) -> Result<HrvGeometric> {
    cfg.validate()?;
    nn.validate()?;
    let hist = Histogram::new(&nn.rr, cfg.bin_width)
        .ok_or_else(|| HrvError::invalid("cannot build a histogram of an empty series"))?;
    let (_, height) = hist.peak();
    Ok(HrvGeometric {
        triangular_index: nn.len() as f64 / height as f64,
        tinn: tinn(&hist),
    })
}

/// Least-squares triangle over the histogram, returns `M - N`.
///
/// The squared error splits into a term depending only on `N` (bins left of
/// the apex) and one depending only on `M`, so each side is fitted on its own.
/// Ties go to the narrowest base.
fn tinn(hist: &Histogram) -> f64 {
    let (peak, height) = hist.peak();
    let height = height as f64;
    let apex = hist.centre(peak);
    let bins = hist.counts.len();
    // prefix[k]: squared counts of bins 0..k, the error of bins the triangle misses.
    let mut prefix = Vec::with_capacity(bins + 1);
    prefix.push(0.0);
    for &c in &hist.counts {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + (c as f64).powi(2));
    }
    let residual = |i: usize, fitted: f64| (hist.counts[i] as f64 - fitted).powi(2);

    let mut left_best = None;
    for left in 0..=peak {
        let n = hist.edge(left);
        let rising: f64 = (left..=peak)
            .map(|i| residual(i, height * (hist.centre(i) - n) / (apex - n)))
            .sum();
        left_best = pick(left_best, prefix[left] + rising, left, |a, b| a > b);
    }

    let mut right_best = None;
    for right in peak + 1..=bins {
        let m = hist.edge(right);
        let falling: f64 = (peak + 1..right)
            .map(|i| residual(i, height * (m - hist.centre(i)) / (m - apex)))
            .sum();
        let missed = prefix[bins] - prefix[right];
        right_best = pick(right_best, missed + falling, right, |a, b| a < b);
    }

    match (left_best, right_best) {
        (Some((_, left)), Some((_, right))) => hist.edge(right) - hist.edge(left),
        _ => hist.bin_width,
    }
}

/// Keeps the lower error; on a tie keeps the index `narrower` prefers.
fn pick(
    best: Option<(f64, usize)>,
    err: f64,
    idx: usize,
    narrower: fn(usize, usize) -> bool,
) -> Option<(f64, usize)> {
    match best {
        Some((best_err, best_idx))
            if err > best_err + 1e-12
                || ((err - best_err).abs() <= 1e-12 && !narrower(idx, best_idx)) =>
        {
            Some((best_err, best_idx))
        }
        _ => Some((err, idx)),
    }
}
