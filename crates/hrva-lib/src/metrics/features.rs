//! Runs every feature group over one NN series and flattens the results.

use crate::{
    config::{FeatureConfig, HrvConfig},
    detectors::{clean_rr_intervals, CleaningReport},
    error::{HrvError, Result},
    metrics::{
        frequency::{hrv_psd, HrvFrequency},
        geometric::{hrv_geometric, HrvGeometric},
        nonlinear::{hrv_nonlinear, HrvNonlinear},
        sqi::SampleQuality,
        time::{hrv_time, HrvTime},
    },
    signal::RRSeries,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureGroup {
    Time,
    Frequency,
    Geometric,
    Nonlinear,
}

impl FeatureGroup {
    pub const ALL: [FeatureGroup; 4] = [
        FeatureGroup::Time,
        FeatureGroup::Frequency,
        FeatureGroup::Geometric,
        FeatureGroup::Nonlinear,
    ];

    /// Feature names this group contributes.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            FeatureGroup::Time => &HrvTime::KEYS,
            FeatureGroup::Frequency => &HrvFrequency::KEYS,
            FeatureGroup::Geometric => &HrvGeometric::KEYS,
            FeatureGroup::Nonlinear => &HrvNonlinear::KEYS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FeatureGroup::Time => "time",
            FeatureGroup::Frequency => "frequency",
            FeatureGroup::Geometric => "geometric",
            FeatureGroup::Nonlinear => "nonlinear",
        }
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureGroup {
    type Err = HrvError;

    fn from_str(s: &str) -> Result<Self> {
        FeatureGroup::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HrvError::config(format!("unknown feature group '{s}'")))
    }
}

/// Feature name → value, `None` where the value is undefined or its group failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap(BTreeMap<String, Option<f64>>);

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Option<f64>) {
        self.0.insert(key.into(), value);
    }

    pub fn extend<'a>(&mut self, entries: impl IntoIterator<Item = (&'a str, Option<f64>)>) {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }

    /// Value of a defined feature.
    pub fn value(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied().flatten()
    }

    /// `Some(None)` for a known but undefined feature.
    pub fn get(&self, key: &str) -> Option<Option<f64>> {
        self.0.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureReport {
    pub features: FeatureMap,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub failures: BTreeMap<FeatureGroup, HrvError>,
}

impl FeatureReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Computes one group's entries.
pub fn group_entries(
    group: FeatureGroup,
    nn: &RRSeries,
    cfg: &FeatureConfig,
) -> Result<Vec<(&'static str, Option<f64>)>> {
    Ok(match group {
        FeatureGroup::Time => hrv_time(nn)?.entries(),
        FeatureGroup::Frequency => hrv_psd(nn, &cfg.frequency)?.entries(),
        FeatureGroup::Geometric => hrv_geometric(nn, &cfg.geometric)?.entries(),
        FeatureGroup::Nonlinear => hrv_nonlinear(nn, &cfg.nonlinear)?.entries(),
    })
}

/// Runs all four groups independently; a failing group leaves its keys undefined.
pub fn extract_features(nn: &RRSeries, cfg: &FeatureConfig) -> FeatureReport {
    let mut report = FeatureReport::default();
    for group in FeatureGroup::ALL {
        match group_entries(group, nn, cfg) {
            Ok(entries) => report.features.extend(entries),
            Err(err) => {
                log::warn!("{group} features unavailable: {err}");
                report
                    .features
                    .extend(group.keys().iter().map(|&key| (key, None)));
                report.failures.insert(group, err);
            }
        }
    }
    report
}

/// Cleaning, quality assessment and features for one raw recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrvAnalysis {
    pub cleaning: CleaningReport,
    pub quality: SampleQuality,
    pub features: FeatureReport,
}

/// Raw RR intervals → cleaned NN series → feature map.
///
/// Filter errors abort; feature failures are recorded per group.
pub fn hrv_pipeline(rr: &[f64], cfg: &HrvConfig) -> Result<HrvAnalysis> {
    cfg.validate()?;
    let cleaning = clean_rr_intervals(rr, &cfg.filter)?;
    let quality = SampleQuality::assess(&cleaning, &cfg.quality);
    let features = extract_features(&cleaning.nn, &cfg.features);
    Ok(HrvAnalysis {
        cleaning,
        quality,
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SpectralMethod, test_support::modulated_rr};

    fn all_keys() -> Vec<&'static str> {
        FeatureGroup::ALL
            .iter()
            .flat_map(|g| g.keys().iter().copied())
            .collect()
    }

    #[test]
    fn long_recording_fills_every_group() {
        let report = extract_features(&modulated_rr(0.25, 30.0, 400), &FeatureConfig::default());
        assert!(report.is_complete(), "{:?}", report.failures);
        assert_eq!(report.features.len(), all_keys().len());
        for key in all_keys() {
            assert!(report.features.contains_key(key), "{key} missing");
        }
        assert!(report.features.value("hf").unwrap() > report.features.value("lf").unwrap());
        assert!(report.features.value("sdnn").is_some());
        assert!(report.features.value("tinn").is_some());
    }

    #[test]
    fn short_recording_fails_only_frequency() {
        let nn = RRSeries::new(vec![800.0, 810.0, 790.0, 805.0, 820.0, 800.0]);
        let report = extract_features(&nn, &FeatureConfig::default());
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures.get(&FeatureGroup::Frequency),
            Some(HrvError::InvalidInput(_))
        ));
        for key in HrvFrequency::KEYS {
            assert_eq!(report.features.get(key), Some(None));
        }
        assert!((report.features.value("mean_nni").unwrap() - 804.1666666666666).abs() < 1e-9);
        assert!(report.features.value("sd1").is_some());
        assert!(report.features.value("triangular_index").is_some());
    }

    #[test]
    fn single_interval_keeps_time_and_geometric() {
        let report = extract_features(&RRSeries::new(vec![800.0]), &FeatureConfig::default());
        assert_eq!(report.features.value("mean_nni"), Some(800.0));
        assert_eq!(report.features.get("sdnn"), Some(None));
        assert_eq!(report.features.value("triangular_index"), Some(1.0));
        let failed: Vec<_> = report.failures.keys().copied().collect();
        assert_eq!(failed, vec![FeatureGroup::Frequency, FeatureGroup::Nonlinear]);
    }

    #[test]
    fn lomb_scargle_handles_short_recordings() {
        let cfg = FeatureConfig {
            frequency: crate::config::FrequencyConfig {
                method: SpectralMethod::Lomb,
                ..Default::default()
            },
            ..FeatureConfig::default()
        };
        let report = extract_features(&modulated_rr(0.25, 30.0, 60), &cfg);
        assert!(report.is_complete(), "{:?}", report.failures);
    }

    #[test]
    fn feature_map_serializes_as_flat_object() {
        let mut map = FeatureMap::new();
        map.insert("sdnn", Some(12.5));
        map.insert("lf_hf_ratio", None);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"lf_hf_ratio":null,"sdnn":12.5}"#);
        let back: FeatureMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn feature_group_parses_case_insensitively() {
        assert_eq!("Frequency".parse::<FeatureGroup>(), Ok(FeatureGroup::Frequency));
        assert!(matches!(
            "spectral".parse::<FeatureGroup>(),
            Err(HrvError::Configuration(_))
        ));
    }

    #[test]
    fn pipeline_cleans_before_extracting() {
        let mut rr = modulated_rr(0.1, 30.0, 400).rr;
        rr[100] = 1600.0;
        rr[250] = 150.0;
        let analysis = hrv_pipeline(&rr, &HrvConfig::default()).unwrap();
        assert_eq!(analysis.cleaning.range_outliers, 1);
        assert_eq!(analysis.cleaning.ectopic_beats, 1);
        assert_eq!(analysis.cleaning.nn.len(), 400);
        assert!(analysis.quality.is_acceptable());
        assert!(analysis.features.is_complete());
        let max = analysis.features.features.value("max_nni").unwrap();
        assert!(max < 900.0, "max_nni {max}");
    }

    #[test]
    fn pipeline_aborts_when_nothing_survives_filtering() {
        assert_eq!(
            hrv_pipeline(&[100.0, 5000.0], &HrvConfig::default()).unwrap_err(),
            HrvError::AllMissing
        );
    }
}
