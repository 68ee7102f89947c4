//! Power spectral density estimators for NN interval series.

use crate::{
    config::{FrequencyConfig, ResampleMethod, SpectralMethod},
    error::{HrvError, Result},
    metrics::resample::resample_rr,
    signal::RRSeries,
    stats::mean,
};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Minimum zero-padded FFT length for Welch segments.
pub const WELCH_NFFT: usize = 4096;

/// Upper bound on the Lomb-Scargle grid; recordings longer than about half an
/// hour get a coarser spacing than `1 / (samples_per_peak * T)`.
pub const LOMB_MAX_FREQUENCIES: usize = 4096;

/// One-sided PSD in ms²/Hz over an increasing frequency grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Psd {
    pub freqs: Vec<f64>,
    pub powers: Vec<f64>,
}

impl Psd {
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.freqs
            .iter()
            .zip(&self.powers)
            .map(|(&f, &p)| [f, p])
            .collect()
    }
}

/// Anything that turns a cleaned NN series into a PSD.
pub trait SpectralEstimator {
    fn estimate(&self, nn: &RRSeries) -> Result<Psd>;
}

/// Welch's averaged periodogram over the uniformly resampled tachogram.
#[derive(Debug, Clone, Copy)]
pub struct Welch {
    pub fs: f64,
    pub interpolation: ResampleMethod,
    pub segment_len: usize,
}

/// Lomb-Scargle periodogram directly on the irregular beat times.
#[derive(Debug, Clone, Copy)]
pub struct LombScargle {
    pub min_freq: f64,
    pub max_freq: f64,
    pub samples_per_peak: f64,
}

/// Builds the estimator selected by `cfg.method`.
pub fn estimator_for(cfg: &FrequencyConfig) -> Box<dyn SpectralEstimator> {
    match cfg.method {
        SpectralMethod::Welch => Box::new(Welch {
            fs: cfg.sampling_frequency,
            interpolation: cfg.interpolation_method,
            segment_len: cfg.welch_segment_len,
        }),
        SpectralMethod::Lomb => Box::new(LombScargle {
            min_freq: cfg.bands.vlf.low,
            max_freq: cfg.bands.hf.high,
            samples_per_peak: 5.0,
        }),
    }
}

impl SpectralEstimator for Welch {
    fn estimate(&self, nn: &RRSeries) -> Result<Psd> {
        let resampled = resample_rr(nn, self.fs, self.interpolation)?;
        let offset = mean(&resampled.data).unwrap_or_default();
        let signal: Vec<f64> = resampled.data.iter().map(|x| x - offset).collect();
        let n = signal.len();
        let window = self.segment_len;
        if n < window {
            return Err(HrvError::invalid(format!(
                "welch needs at least {window} resampled samples ({:.1} s at {} Hz), got {n}",
                window as f64 / self.fs,
                self.fs
            )));
        }
        let step = window - window / 2;
        let nfft = WELCH_NFFT.max(window);
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(nfft);
        let window_func = hann(window);
        let scale = 1.0 / (self.fs * window_func.iter().map(|w| w * w).sum::<f64>());
        let bins = nfft / 2 + 1;
        let mut powers = vec![0.0; bins];
        let mut segments = 0usize;
        let mut pos = 0;
        while pos + window <= n {
            let slice = &signal[pos..pos + window];
            let seg_mean = mean(slice).unwrap_or_default();
            let mut frame = r2c.make_input_vec();
            for (dst, (x, w)) in frame.iter_mut().zip(slice.iter().zip(&window_func)) {
                *dst = (x - seg_mean) * w;
            }
            let mut spectrum = r2c.make_output_vec();
            r2c.process(&mut frame, &mut spectrum)
                .map_err(|e| HrvError::Spectral(e.to_string()))?;
            for (k, val) in spectrum.iter().enumerate() {
                let one_sided = if k == 0 || (nfft % 2 == 0 && k == nfft / 2) {
                    1.0
                } else {
                    2.0
                };
                powers[k] += one_sided * val.norm_sqr() * scale;
            }
            segments += 1;
            pos += step;
        }
        for p in powers.iter_mut() {
            *p /= segments as f64;
        }
        log::debug!("welch: {segments} segment(s) of {window} samples, nfft {nfft}");
        let freqs = (0..bins).map(|k| k as f64 * self.fs / nfft as f64).collect();
        Ok(Psd { freqs, powers })
    }
}

impl SpectralEstimator for LombScargle {
    fn estimate(&self, nn: &RRSeries) -> Result<Psd> {
        nn.validate()?;
        if nn.len() < 3 {
            return Err(HrvError::invalid(format!(
                "lomb-scargle needs at least 3 intervals, got {}",
                nn.len()
            )));
        }
        if !(self.min_freq >= 0.0 && self.max_freq > self.min_freq) {
            return Err(HrvError::config(format!(
                "lomb-scargle range [{}, {}] is empty",
                self.min_freq, self.max_freq
            )));
        }
        let times = nn.timestamps();
        let baseline = times.last().copied().unwrap_or_default();
        let offset = mean(&nn.rr).unwrap_or_default();
        let y: Vec<f64> = nn.rr.iter().map(|v| v - offset).collect();

        let span = self.max_freq - self.min_freq;
        let df = (1.0 / (self.samples_per_peak * baseline))
            .max(span / (LOMB_MAX_FREQUENCIES - 1) as f64);
        let count = (1 + (span / df).round() as usize).min(LOMB_MAX_FREQUENCIES);
        let freqs: Vec<f64> = (0..count).map(|k| self.min_freq + df * k as f64).collect();
        let powers = freqs
            .iter()
            .map(|&f| lomb_power(&times, &y, f))
            .collect();
        log::debug!("lomb-scargle: {count} frequencies, df {df:.5} Hz");
        Ok(Psd { freqs, powers })
    }
}

fn lomb_power(t: &[f64], y: &[f64], freq: f64) -> f64 {
    if freq <= 0.0 {
        return 0.0;
    }
    let omega = 2.0 * PI * freq;
    let (s2, c2) = t.iter().fold((0.0, 0.0), |(s, c), &ti| {
        (s + (2.0 * omega * ti).sin(), c + (2.0 * omega * ti).cos())
    });
    let tau = s2.atan2(c2) / (2.0 * omega);
    let mut yc = 0.0;
    let mut ys = 0.0;
    let mut cc = 0.0;
    let mut ss = 0.0;
    for (&ti, &yi) in t.iter().zip(y) {
        let (sin, cos) = (omega * (ti - tau)).sin_cos();
        yc += yi * cos;
        ys += yi * sin;
        cc += cos * cos;
        ss += sin * sin;
    }
    let mut power = 0.0;
    if cc > f64::EPSILON {
        power += yc * yc / cc;
    }
    if ss > f64::EPSILON {
        power += ys * ys / ss;
    }
    0.5 * power
}

/// Periodic Hann window.
fn hann(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (size as f64)).cos()))
        .collect()
}
