//! Per-call configuration. Every struct has a `Default` and deserializes from
//! partial TOML documents, so callers only override what they need.

use crate::detectors::ectopic::EctopicRule;
use crate::error::{HrvError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Half-open frequency band `[low, high)` in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.low && freq < self.high
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if !(self.low.is_finite() && self.high.is_finite()) || self.low < 0.0 {
            return Err(HrvError::config(format!(
                "{name} band [{}, {}) must be finite and non-negative",
                self.low, self.high
            )));
        }
        if self.low >= self.high {
            return Err(HrvError::config(format!(
                "{name} band low {} must be below high {}",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

pub const VLF_BAND: Band = Band::new(0.0033, 0.04);
pub const LF_BAND: Band = Band::new(0.04, 0.15);
pub const HF_BAND: Band = Band::new(0.15, 0.40);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyBands {
    pub vlf: Band,
    pub lf: Band,
    pub hf: Band,
}

impl Default for FrequencyBands {
    fn default() -> Self {
        Self {
            vlf: VLF_BAND,
            lf: LF_BAND,
            hf: HF_BAND,
        }
    }
}

impl FrequencyBands {
    pub fn validate(&self) -> Result<()> {
        self.vlf.validate("vlf")?;
        self.lf.validate("lf")?;
        self.hf.validate("hf")
    }
}

/// How missing positions are filled after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum GapInterpolation {
    #[default]
    Linear,
}

impl FromStr for GapInterpolation {
    type Err = HrvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            other => Err(HrvError::config(format!(
                "unknown interpolation method '{other}', expected linear"
            ))),
        }
    }
}

/// Interpolation used to put the tachogram on a uniform time grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ResampleMethod {
    #[default]
    Linear,
    Cubic,
}

impl FromStr for ResampleMethod {
    type Err = HrvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "cubic" => Ok(Self::Cubic),
            other => Err(HrvError::config(format!(
                "unknown resampling method '{other}', expected linear or cubic"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SpectralMethod {
    #[default]
    Welch,
    Lomb,
}

impl FromStr for SpectralMethod {
    type Err = HrvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "welch" => Ok(Self::Welch),
            "lomb" | "lomb-scargle" => Ok(Self::Lomb),
            other => Err(HrvError::config(format!(
                "unknown spectral method '{other}', expected welch or lomb"
            ))),
        }
    }
}

macro_rules! deserialize_via_from_str {
    ($($ty:ty),*) => {$(
        impl TryFrom<String> for $ty {
            type Error = HrvError;

            fn try_from(name: String) -> Result<Self> {
                name.parse()
            }
        }
    )*};
}

deserialize_via_from_str!(GapInterpolation, ResampleMethod, SpectralMethod);

/// Artifact filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Lowest plausible interval (ms), inclusive.
    pub low_rri: f64,
    /// Highest plausible interval (ms), inclusive.
    pub high_rri: f64,
    pub ectopic: EctopicRule,
    pub interpolation: GapInterpolation,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            low_rri: 300.0,
            high_rri: 2000.0,
            ectopic: EctopicRule::default(),
            interpolation: GapInterpolation::Linear,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.low_rri.is_finite() && self.high_rri.is_finite())
            || self.low_rri <= 0.0
            || self.low_rri > self.high_rri
        {
            return Err(HrvError::config(format!(
                "valid interval range [{}, {}] is empty",
                self.low_rri, self.high_rri
            )));
        }
        self.ectopic.validate()
    }
}

/// Frequency-domain settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyConfig {
    pub method: SpectralMethod,
    /// Resampling frequency (Hz) for the Welch path.
    pub sampling_frequency: f64,
    pub interpolation_method: ResampleMethod,
    /// Welch segment length in resampled samples.
    pub welch_segment_len: usize,
    pub bands: FrequencyBands,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            method: SpectralMethod::Welch,
            sampling_frequency: 7.0,
            interpolation_method: ResampleMethod::Linear,
            welch_segment_len: 256,
            bands: FrequencyBands::default(),
        }
    }
}

impl FrequencyConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.sampling_frequency.is_finite() && self.sampling_frequency > 0.0) {
            return Err(HrvError::config(format!(
                "sampling frequency must be positive, got {}",
                self.sampling_frequency
            )));
        }
        if self.welch_segment_len < 2 {
            return Err(HrvError::config("welch segment length must be at least 2"));
        }
        self.bands.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometricConfig {
    /// Histogram bin width (ms); 7.8125 ms matches 128 Hz quantization.
    pub bin_width: f64,
}

impl Default for GeometricConfig {
    fn default() -> Self {
        Self { bin_width: 7.8125 }
    }
}

impl GeometricConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.bin_width.is_finite() && self.bin_width > 0.0) {
            return Err(HrvError::config(format!(
                "histogram bin width must be positive, got {}",
                self.bin_width
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonlinearConfig {
    /// Sample entropy embedding dimension.
    pub sampen_m: usize,
    /// Sample entropy tolerance as a fraction of SDNN.
    pub sampen_r_factor: f64,
}

impl Default for NonlinearConfig {
    fn default() -> Self {
        Self {
            sampen_m: 2,
            sampen_r_factor: 0.2,
        }
    }
}

impl NonlinearConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sampen_m == 0 {
            return Err(HrvError::config("sample entropy dimension must be >= 1"));
        }
        if !(self.sampen_r_factor.is_finite() && self.sampen_r_factor > 0.0) {
            return Err(HrvError::config(format!(
                "sample entropy tolerance factor must be positive, got {}",
                self.sampen_r_factor
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub frequency: FrequencyConfig,
    pub geometric: GeometricConfig,
    pub nonlinear: NonlinearConfig,
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        self.frequency.validate()?;
        self.geometric.validate()?;
        self.nonlinear.validate()
    }
}

/// Thresholds deciding whether a cleaned recording is usable for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Largest tolerated fraction of removed samples.
    pub max_outlier_ratio: f64,
    /// Fewest beats for a reliable spectral estimate.
    pub min_beats: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_outlier_ratio: 0.04,
            min_beats: 240,
        }
    }
}

impl QualityConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.max_outlier_ratio) {
            return Err(HrvError::config(format!(
                "max_outlier_ratio must lie in [0, 1], got {}",
                self.max_outlier_ratio
            )));
        }
        Ok(())
    }
}

/// Top-level configuration, as loaded from a TOML file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrvConfig {
    pub filter: FilterConfig,
    pub features: FeatureConfig,
    pub quality: QualityConfig,
}

impl HrvConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: HrvConfig =
            toml::from_str(text).map_err(|e| HrvError::config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.features.validate()?;
        self.quality.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = HrvConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, HrvConfig::default());
        assert_eq!(cfg.filter.ectopic, EctopicRule::malik());
        assert_eq!(cfg.features.frequency.sampling_frequency, 7.0);
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let cfg = HrvConfig::from_toml_str(
            r#"
            [filter]
            low_rri = 350.0

            [filter.ectopic]
            method = "kamath"

            [features.frequency]
            method = "lomb"
            interpolation_method = "cubic"

            [features.frequency.bands.hf]
            low = 0.15
            high = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.filter.low_rri, 350.0);
        assert_eq!(cfg.filter.high_rri, 2000.0);
        assert_eq!(cfg.filter.ectopic, EctopicRule::kamath());
        assert_eq!(cfg.features.frequency.method, SpectralMethod::Lomb);
        assert_eq!(
            cfg.features.frequency.interpolation_method,
            ResampleMethod::Cubic
        );
        assert_eq!(cfg.features.frequency.bands.hf, Band::new(0.15, 0.5));
        assert_eq!(cfg.features.frequency.bands.lf, LF_BAND);
    }

    #[test]
    fn toml_method_names_match_the_command_line() {
        let cfg = HrvConfig::from_toml_str(
            r#"
            [filter.ectopic]
            method = "Mean_Last9"
            max_deviation = 0.15

            [features.frequency]
            method = "Lomb-Scargle"
            interpolation_method = "CUBIC"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.filter.ectopic,
            EctopicRule::Acar {
                max_deviation: 0.15,
                window: 9
            }
        );
        assert_eq!(cfg.features.frequency.method, SpectralMethod::Lomb);
        assert_eq!(
            cfg.features.frequency.interpolation_method,
            ResampleMethod::Cubic
        );
        let err = HrvConfig::from_toml_str("[features.frequency]\nmethod = \"burg\"\n").unwrap_err();
        assert!(matches!(err, HrvError::Configuration(_)));
    }

    #[test]
    fn unknown_method_is_configuration_error() {
        let err = HrvConfig::from_toml_str("[filter.ectopic]\nmethod = \"bogus\"\n").unwrap_err();
        assert!(matches!(err, HrvError::Configuration(_)));
    }

    #[test]
    fn inverted_band_is_rejected() {
        let mut cfg = FrequencyConfig::default();
        cfg.bands.lf = Band::new(0.15, 0.04);
        assert!(matches!(cfg.validate(), Err(HrvError::Configuration(_))));
    }

    #[test]
    fn non_positive_sampling_frequency_is_rejected() {
        let cfg = FrequencyConfig {
            sampling_frequency: 0.0,
            ..FrequencyConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(HrvError::Configuration(_))));
    }

    #[test]
    fn band_is_half_open() {
        assert!(LF_BAND.contains(0.04));
        assert!(!LF_BAND.contains(0.15));
        assert!(HF_BAND.contains(0.15));
    }

    #[test]
    fn method_names_parse_case_insensitively() {
        assert_eq!("Welch".parse::<SpectralMethod>().unwrap(), SpectralMethod::Welch);
        assert_eq!("LOMB".parse::<SpectralMethod>().unwrap(), SpectralMethod::Lomb);
        assert_eq!("cubic".parse::<ResampleMethod>().unwrap(), ResampleMethod::Cubic);
        assert!("spline".parse::<GapInterpolation>().is_err());
    }
}
