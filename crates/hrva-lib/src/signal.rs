use crate::error::{HrvError, Result};
use serde::{Deserialize, Serialize};

/// Uniformly sampled signal, e.g. a resampled tachogram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// RR/NN intervals (milliseconds), every sample present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    pub fn new(rr: Vec<f64>) -> Self {
        Self { rr }
    }

    pub fn len(&self) -> usize {
        self.rr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }

    /// Fails unless the series is non-empty and every interval is finite and > 0.
    pub fn validate(&self) -> Result<()> {
        validate_intervals(&self.rr)
    }

    /// Beat times in seconds relative to the first beat.
    ///
    /// `t[0]` is always 0 and the sequence strictly increases for valid intervals.
    pub fn timestamps(&self) -> Vec<f64> {
        let mut times = Vec::with_capacity(self.rr.len());
        let mut acc = 0.0;
        for (i, interval) in self.rr.iter().enumerate() {
            if i > 0 {
                acc += interval;
            }
            times.push(acc / 1000.0);
        }
        times
    }

    /// Successive differences `rr[i+1] - rr[i]`.
    pub fn diffs(&self) -> Vec<f64> {
        self.rr.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Instantaneous heart rate (bpm) for every interval.
    pub fn heart_rate(&self) -> Vec<f64> {
        self.rr.iter().map(|rr| 60_000.0 / rr).collect()
    }
}

impl From<Vec<f64>> for RRSeries {
    fn from(rr: Vec<f64>) -> Self {
        Self { rr }
    }
}

/// Interval sequence where rejected positions are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedRR {
    pub samples: Vec<Option<f64>>,
}

impl MaskedRR {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_none()).count()
    }

    pub fn missing_indices(&self) -> Vec<usize> {
        self.samples
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_none().then_some(i))
            .collect()
    }

    /// Present values, in order, skipping missing positions.
    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().flatten().copied()
    }

    /// Converts to an [`RRSeries`] if nothing is missing.
    pub fn to_complete(&self) -> Option<RRSeries> {
        self.samples
            .iter()
            .copied()
            .collect::<Option<Vec<f64>>>()
            .map(RRSeries::new)
    }
}

impl From<&[f64]> for MaskedRR {
    fn from(values: &[f64]) -> Self {
        Self {
            samples: values.iter().copied().map(Some).collect(),
        }
    }
}

impl From<&RRSeries> for MaskedRR {
    fn from(series: &RRSeries) -> Self {
        Self::from(series.rr.as_slice())
    }
}

pub(crate) fn validate_intervals(rr: &[f64]) -> Result<()> {
    if rr.is_empty() {
        return Err(HrvError::invalid("interval sequence is empty"));
    }
    if let Some((idx, value)) = rr
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v <= 0.0)
    {
        return Err(HrvError::invalid(format!(
            "interval {idx} must be a positive finite value, got {value}"
        )));
    }
    Ok(())
}
