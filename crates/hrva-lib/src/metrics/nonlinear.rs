use crate::{
    config::NonlinearConfig,
    error::{HrvError, Result},
    signal::RRSeries,
    stats::{mean, std_dev, variance},
};
use serde::{Deserialize, Serialize};

/// Poincaré, entropy and fractal features.
///
/// Values that are undefined for the given series (zero SD1, too few beats
/// for entropy or DFA, ...) are `None` rather than NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvNonlinear {
    pub sd1: Option<f64>,
    pub sd2: Option<f64>,
    pub ratio_sd2_sd1: Option<f64>,
    pub csi: Option<f64>,
    pub cvi: Option<f64>,
    pub modified_csi: Option<f64>,
    pub modified_cvi: Option<f64>,
    pub sampen: Option<f64>,
    pub dfa_alpha1: Option<f64>,
}

impl HrvNonlinear {
    pub const KEYS: [&'static str; 9] = [
        "sd1",
        "sd2",
        "ratio_sd2_sd1",
        "csi",
        "cvi",
        "modified_csi",
        "modified_cvi",
        "sampen",
        "dfa_alpha1",
    ];

    pub fn entries(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("sd1", self.sd1),
            ("sd2", self.sd2),
            ("ratio_sd2_sd1", self.ratio_sd2_sd1),
            ("csi", self.csi),
            ("cvi", self.cvi),
            ("modified_csi", self.modified_csi),
            ("modified_cvi", self.modified_cvi),
            ("sampen", self.sampen),
            ("dfa_alpha1", self.dfa_alpha1),
        ]
    }
}

/// Poincaré descriptors (ms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Poincare {
    pub sd1: f64,
    pub sd2: f64,
}

impl Poincare {
    /// Closed form from the unbiased variances of the series and its differences.
    pub fn from_series(nn: &RRSeries) -> Option<Self> {
        let var_diff = variance(&nn.diffs(), 1)?;
        let var_nn = variance(&nn.rr, 1)?;
        Some(Self {
            sd1: (0.5 * var_diff).sqrt(),
            sd2: (2.0 * var_nn - 0.5 * var_diff).max(0.0).sqrt(),
        })
    }

    fn ratio(&self) -> Option<f64> {
        (self.sd1 > 0.0).then(|| self.sd2 / self.sd1)
    }

    fn cvi(&self) -> Option<f64> {
        let area = std::f64::consts::PI * self.sd1 * self.sd2;
        (area > 0.0).then(|| area.log10())
    }

    /// Ellipse axes `T = 4·SD1`, `L = 4·SD2`.
    fn axes(&self) -> (f64, f64) {
        (4.0 * self.sd1, 4.0 * self.sd2)
    }

    fn modified_csi(&self) -> Option<f64> {
        let (t, l) = self.axes();
        (t > 0.0).then(|| l * l / t)
    }

    fn modified_cvi(&self) -> Option<f64> {
        let (t, l) = self.axes();
        (l * t > 0.0).then(|| (l * t).log10())
    }
}

pub fn hrv_nonlinear(nn: &RRSeries, cfg: &NonlinearConfig) -> Result<HrvNonlinear> {
    cfg.validate()?;
    nn.validate()?;
    if nn.len() < 2 {
        return Err(HrvError::invalid(format!(
            "nonlinear features need at least 2 intervals, got {}",
            nn.len()
        )));
    }
    let poincare = Poincare::from_series(nn);
    let sampen = if nn.len() >= cfg.sampen_m + 2 {
        let r = cfg.sampen_r_factor * std_dev(&nn.rr, 1).unwrap_or_default();
        sample_entropy(&nn.rr, cfg.sampen_m, r)?
    } else {
        log::debug!(
            "sample entropy skipped: {} intervals for m = {}",
            nn.len(),
            cfg.sampen_m
        );
        None
    };
    Ok(HrvNonlinear {
        sd1: poincare.map(|p| p.sd1),
        sd2: poincare.map(|p| p.sd2),
        ratio_sd2_sd1: poincare.and_then(|p| p.ratio()),
        csi: poincare.and_then(|p| p.ratio()),
        cvi: poincare.and_then(|p| p.cvi()),
        modified_csi: poincare.and_then(|p| p.modified_csi()),
        modified_cvi: poincare.and_then(|p| p.modified_cvi()),
        sampen,
        dfa_alpha1: detrended_fluctuation_alpha1(&nn.rr),
    })
}

/// Sample entropy `-ln(A / B)` with Chebyshev distance and tolerance `r`.
///
/// `B` counts template pairs of length `m` within `r`, `A` the same pairs
/// extended to `m + 1`; both use the first `N - m` templates and exclude
/// self-matches. `Ok(None)` when either count is zero.
pub fn sample_entropy(data: &[f64], m: usize, r: f64) -> Result<Option<f64>> {
    if m == 0 {
        return Err(HrvError::config("sample entropy dimension must be >= 1"));
    }
    if !(r.is_finite() && r >= 0.0) {
        return Err(HrvError::config(format!(
            "sample entropy tolerance must be non-negative, got {r}"
        )));
    }
    if data.len() < m + 2 {
        return Err(HrvError::invalid(format!(
            "sample entropy with m = {m} needs at least {} samples, got {}",
            m + 2,
            data.len()
        )));
    }
    let templates = data.len() - m;
    let within =
        |i: usize, j: usize, len: usize| (0..len).all(|k| (data[i + k] - data[j + k]).abs() <= r);
    let mut count_m = 0u64;
    let mut count_m1 = 0u64;
    for i in 0..templates {
        for j in (i + 1)..templates {
            if within(i, j, m) {
                count_m += 1;
                if within(i + m, j + m, 1) {
                    count_m1 += 1;
                }
            }
        }
    }
    if count_m == 0 || count_m1 == 0 {
        return Ok(None);
    }
    Ok(Some(-(count_m1 as f64 / count_m as f64).ln()))
}

/// Short-term DFA exponent over windows of 4 to 16 beats.
pub fn detrended_fluctuation_alpha1(rr: &[f64]) -> Option<f64> {
    const MIN_WINDOW: usize = 4;
    const MAX_WINDOW: usize = 16;
    if rr.len() < MIN_WINDOW * 2 {
        return None;
    }
    let offset = mean(rr)?;
    let profile: Vec<f64> = rr
        .iter()
        .scan(0.0, |acc, &value| {
            *acc += value - offset;
            Some(*acc)
        })
        .collect();
    let max_window = rr.len().min(MAX_WINDOW);
    let samples: Vec<(f64, f64)> = (MIN_WINDOW..=max_window)
        .filter_map(|window| {
            let chunks = profile.chunks_exact(window);
            let segments = chunks.len();
            if segments == 0 {
                return None;
            }
            let total: f64 = chunks.map(detrended_mean_square).sum();
            let rms = (total / segments as f64).sqrt();
            (rms.is_finite() && rms > 0.0).then_some((window as f64, rms))
        })
        .collect();
    log_log_slope(&samples)
}

/// Mean squared residual of `segment` around its least-squares trend line.
fn detrended_mean_square(segment: &[f64]) -> f64 {
    let points: Vec<(f64, f64)> = segment
        .iter()
        .enumerate()
        .map(|(i, &y)| (i as f64, y))
        .collect();
    let (slope, intercept) =
        linear_fit(&points).unwrap_or((0.0, mean(segment).unwrap_or_default()));
    points
        .iter()
        .map(|&(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum::<f64>()
        / segment.len() as f64
}

/// Ordinary least-squares line, returns `(slope, intercept)`.
///
/// `None` for fewer than two points or when every `x` is the same.
fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let xs: Vec<f64> = points.iter().map(|&(x, _)| x).collect();
    let ys: Vec<f64> = points.iter().map(|&(_, y)| y).collect();
    let (mean_x, mean_y) = (mean(&xs)?, mean(&ys)?);
    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        (sxy + (x - mean_x) * (y - mean_y), sxx + (x - mean_x).powi(2))
    });
    if sxx < f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

fn log_log_slope(points: &[(f64, f64)]) -> Option<f64> {
    let logs: Vec<(f64, f64)> = points
        .iter()
        .filter(|(scale, rms)| *scale > 0.0 && *rms > 0.0)
        .map(|(scale, rms)| (scale.ln(), rms.ln()))
        .collect();
    linear_fit(&logs).map(|(slope, _)| slope)
}
