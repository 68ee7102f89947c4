//! Puts an unevenly sampled tachogram on a uniform time grid.

use crate::{
    config::ResampleMethod,
    error::{HrvError, Result},
    signal::{RRSeries, TimeSeries},
};

/// Uniform grid `k / fs` for every `k / fs < duration`.
pub fn interpolation_grid(duration: f64, fs: f64) -> Vec<f64> {
    let mut grid = Vec::new();
    let mut k = 0usize;
    loop {
        let t = k as f64 / fs;
        if t >= duration {
            break;
        }
        grid.push(t);
        k += 1;
    }
    grid
}

/// Resamples NN intervals (value at each beat time) at `fs` Hz.
pub fn resample_rr(nn: &RRSeries, fs: f64, method: ResampleMethod) -> Result<TimeSeries> {
    nn.validate()?;
    if !(fs.is_finite() && fs > 0.0) {
        return Err(HrvError::config(format!(
            "sampling frequency must be positive, got {fs}"
        )));
    }
    let times = nn.timestamps();
    let duration = times.last().copied().unwrap_or_default();
    let grid = interpolation_grid(duration, fs);
    if grid.len() < 2 {
        return Err(HrvError::invalid(format!(
            "recording of {duration:.3} s is too short to resample at {fs} Hz"
        )));
    }
    let data = match method {
        ResampleMethod::Linear => linear_at(&times, &nn.rr, &grid),
        ResampleMethod::Cubic => CubicSpline::new(&times, &nn.rr).eval_many(&grid),
    };
    log::debug!(
        "resampled {} intervals to {} samples at {fs} Hz ({method:?})",
        nn.len(),
        data.len()
    );
    Ok(TimeSeries { fs, data })
}

/// Piecewise-linear interpolation of `(xs, ys)` at sorted query points.
fn linear_at(xs: &[f64], ys: &[f64], query: &[f64]) -> Vec<f64> {
    let mut idx = 0;
    query
        .iter()
        .map(|&t| {
            while idx + 2 < xs.len() && xs[idx + 1] < t {
                idx += 1;
            }
            if xs.len() == 1 {
                return ys[0];
            }
            let (x0, x1) = (xs[idx], xs[idx + 1]);
            let (y0, y1) = (ys[idx], ys[idx + 1]);
            y0 + (y1 - y0) * (t - x0) / (x1 - x0)
        })
        .collect()
}

/// Natural cubic spline through strictly increasing knots.
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots.
    m: Vec<f64>,
}

impl CubicSpline {
    pub fn new(xs: &[f64], ys: &[f64]) -> Self {
        let n = xs.len();
        let mut m = vec![0.0; n];
        if n >= 3 {
            // Thomas algorithm on the interior equations, M[0] = M[n-1] = 0.
            let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
            let size = n - 2;
            let mut diag = vec![0.0; size];
            let mut rhs = vec![0.0; size];
            for i in 0..size {
                let k = i + 1;
                diag[i] = 2.0 * (h[k - 1] + h[k]);
                rhs[i] = 6.0 * ((ys[k + 1] - ys[k]) / h[k] - (ys[k] - ys[k - 1]) / h[k - 1]);
            }
            for i in 1..size {
                let w = h[i] / diag[i - 1];
                diag[i] -= w * h[i];
                rhs[i] -= w * rhs[i - 1];
            }
            m[size] = rhs[size - 1] / diag[size - 1];
            for i in (0..size - 1).rev() {
                m[i + 1] = (rhs[i] - h[i + 1] * m[i + 2]) / diag[i];
            }
        }
        Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            m,
        }
    }

    pub fn eval(&self, t: f64) -> f64 {
        let n = self.xs.len();
        if n == 1 {
            return self.ys[0];
        }
        let seg = match self.xs.partition_point(|&x| x <= t) {
            0 => 0,
            p => (p - 1).min(n - 2),
        };
        self.eval_segment(seg, t)
    }

    pub fn eval_many(&self, query: &[f64]) -> Vec<f64> {
        query.iter().map(|&t| self.eval(t)).collect()
    }

    fn eval_segment(&self, i: usize, t: f64) -> f64 {
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - t) / h;
        let b = (t - self.xs[i]) / h;
        a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * h * h / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_excludes_the_last_timestamp() {
        let nn = RRSeries::new(vec![1000.0, 900.0, 1100.0, 1000.0, 950.0, 850.0]);
        let duration = *nn.timestamps().last().unwrap();
        let grid = interpolation_grid(duration, 2.0);
        let expected = [0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5];
        assert_eq!(grid, expected.to_vec());
    }

    #[test]
    fn linear_resampling_hits_knots() {
        let nn = RRSeries::new(vec![1000.0, 1000.0, 1200.0, 800.0]);
        // beat times: 0, 1.0, 2.2, 3.0
        let ts = resample_rr(&nn, 5.0, ResampleMethod::Linear).unwrap();
        assert_eq!(ts.fs, 5.0);
        assert_eq!(ts.len(), 15);
        assert!((ts.data[0] - 1000.0).abs() < 1e-9);
        assert!((ts.data[5] - 1000.0).abs() < 1e-9);
        // t = 1.6 lies halfway between 1.0 (1000) and 2.2 (1200)
        assert!((ts.data[8] - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn cubic_spline_reproduces_knots_and_lines() {
        let xs = [0.0, 1.0, 2.5, 3.0, 4.2];
        let line: Vec<f64> = xs.iter().map(|x| 3.0 * x + 1.0).collect();
        let spline = CubicSpline::new(&xs, &line);
        for (x, y) in xs.iter().zip(&line) {
            assert!((spline.eval(*x) - y).abs() < 1e-9);
        }
        assert!((spline.eval(1.7) - (3.0 * 1.7 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn cubic_spline_is_smooth_between_knots() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 0.0, 1.0];
        let spline = CubicSpline::new(&xs, &ys);
        let left = spline.eval(1.0 - 1e-6);
        let right = spline.eval(1.0 + 1e-6);
        assert!((left - right).abs() < 1e-4);
        assert!((spline.eval(2.0)).abs() < 1e-12);
    }

    #[test]
    fn too_short_or_bad_frequency_fails() {
        let nn = RRSeries::new(vec![800.0]);
        assert!(matches!(
            resample_rr(&nn, 4.0, ResampleMethod::Linear),
            Err(HrvError::InvalidInput(_))
        ));
        let nn = RRSeries::new(vec![800.0, 810.0, 820.0]);
        assert!(matches!(
            resample_rr(&nn, 0.0, ResampleMethod::Linear),
            Err(HrvError::Configuration(_))
        ));
    }
}
