use crate::{
    config::{Band, FrequencyConfig},
    error::Result,
    metrics::spectral::{estimator_for, Psd},
    signal::RRSeries,
    stats::trapezoid,
};
use serde::{Deserialize, Serialize};

/// Band powers (ms²) and normalized units of the NN tachogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvFrequency {
    pub vlf: f64,
    pub lf: f64,
    pub hf: f64,
    pub lf_hf_ratio: Option<f64>,
    pub lfnu: Option<f64>,
    pub hfnu: Option<f64>,
    pub total_power: f64,
}

impl HrvFrequency {
    pub const KEYS: [&'static str; 7] = [
        "vlf",
        "lf",
        "hf",
        "lf_hf_ratio",
        "lfnu",
        "hfnu",
        "total_power",
    ];

    pub fn entries(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("vlf", Some(self.vlf)),
            ("lf", Some(self.lf)),
            ("hf", Some(self.hf)),
            ("lf_hf_ratio", self.lf_hf_ratio),
            ("lfnu", self.lfnu),
            ("hfnu", self.hfnu),
            ("total_power", Some(self.total_power)),
        ]
    }

    fn from_band_powers(vlf: f64, lf: f64, hf: f64) -> Self {
        let lf_hf_ratio = (hf != 0.0).then(|| lf / hf);
        let (lfnu, hfnu) = if lf + hf != 0.0 {
            (Some(100.0 * lf / (lf + hf)), Some(100.0 * hf / (lf + hf)))
        } else {
            (None, None)
        };
        Self {
            vlf,
            lf,
            hf,
            lf_hf_ratio,
            lfnu,
            hfnu,
            total_power: vlf + lf + hf,
        }
    }
}

/// PSD of the NN series with the configured estimator.
pub fn power_spectrum(nn: &RRSeries, cfg: &FrequencyConfig) -> Result<Psd> {
    cfg.validate()?;
    nn.validate()?;
    log::debug!(
        "psd via {:?} (fs {} Hz, {:?} resampling)",
        cfg.method,
        cfg.sampling_frequency,
        cfg.interpolation_method
    );
    estimator_for(cfg).estimate(nn)
}

pub fn hrv_psd(nn: &RRSeries, cfg: &FrequencyConfig) -> Result<HrvFrequency> {
    let psd = power_spectrum(nn, cfg)?;
    Ok(band_powers(&psd, cfg))
}

/// Integrates `psd` over the configured bands.
pub fn band_powers(psd: &Psd, cfg: &FrequencyConfig) -> HrvFrequency {
    let bands = &cfg.bands;
    HrvFrequency::from_band_powers(
        integrate_band(psd, &bands.vlf),
        integrate_band(psd, &bands.lf),
        integrate_band(psd, &bands.hf),
    )
}

fn integrate_band(psd: &Psd, band: &Band) -> f64 {
    let (freqs, powers): (Vec<f64>, Vec<f64>) = psd
        .freqs
        .iter()
        .zip(&psd.powers)
        .filter(|(f, _)| band.contains(**f))
        .map(|(f, p)| (*f, *p))
        .unzip();
    trapezoid(&freqs, &powers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SpectralMethod, error::HrvError, test_support::modulated_rr};

    #[test]
    fn respiratory_modulation_lands_in_hf() {
        let m = hrv_psd(&modulated_rr(0.25, 40.0, 400), &FrequencyConfig::default()).unwrap();
        assert!(m.hf > m.lf, "hf {} lf {}", m.hf, m.lf);
        assert!(m.hfnu.unwrap() > 50.0);
        assert!(m.lf_hf_ratio.unwrap() < 1.0);
    }

    #[test]
    fn baroreflex_modulation_lands_in_lf() {
        let m = hrv_psd(&modulated_rr(0.1, 40.0, 400), &FrequencyConfig::default()).unwrap();
        assert!(m.lf > m.hf, "hf {} lf {}", m.hf, m.lf);
        assert!(m.lfnu.unwrap() > 50.0);
    }

    #[test]
    fn powers_are_consistent() {
        let m = hrv_psd(&modulated_rr(0.2, 25.0, 500), &FrequencyConfig::default()).unwrap();
        for p in [m.vlf, m.lf, m.hf] {
            assert!(p >= 0.0);
        }
        assert!((m.total_power - (m.vlf + m.lf + m.hf)).abs() < 1e-9);
        let nu = m.lfnu.unwrap() + m.hfnu.unwrap();
        assert!((nu - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_power_leaves_ratios_undefined() {
        let m = HrvFrequency::from_band_powers(0.0, 0.0, 0.0);
        assert_eq!(m.total_power, 0.0);
        assert!(m.lf_hf_ratio.is_none());
        assert!(m.lfnu.is_none());
        assert!(m.hfnu.is_none());
        let m = HrvFrequency::from_band_powers(1.0, 2.0, 0.0);
        assert!(m.lf_hf_ratio.is_none());
        assert_eq!(m.lfnu, Some(100.0));
    }

    #[test]
    fn band_integration_is_half_open() {
        let psd = Psd {
            freqs: vec![0.0, 0.04, 0.1, 0.15, 0.2, 0.4],
            powers: vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        };
        let m = band_powers(&psd, &FrequencyConfig::default());
        // lf keeps 0.04 and 0.1, hf keeps 0.15 and 0.2
        assert!((m.lf - 0.06).abs() < 1e-12);
        assert!((m.hf - 0.05).abs() < 1e-12);
        assert_eq!(m.vlf, 0.0);
    }

    #[test]
    fn short_recording_is_invalid() {
        let err = hrv_psd(&modulated_rr(0.2, 25.0, 30), &FrequencyConfig::default()).unwrap_err();
        assert!(matches!(err, HrvError::InvalidInput(_)));
    }

    #[test]
    fn lomb_scargle_also_separates_bands() {
        let cfg = FrequencyConfig {
            method: SpectralMethod::Lomb,
            ..FrequencyConfig::default()
        };
        let m = hrv_psd(&modulated_rr(0.25, 40.0, 300), &cfg).unwrap();
        assert!(m.hf > m.lf);
        let m = hrv_psd(&modulated_rr(0.1, 40.0, 300), &cfg).unwrap();
        assert!(m.lf > m.hf);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let cfg = FrequencyConfig {
            sampling_frequency: -1.0,
            ..FrequencyConfig::default()
        };
        let err = hrv_psd(&modulated_rr(0.2, 25.0, 400), &cfg).unwrap_err();
        assert!(matches!(err, HrvError::Configuration(_)));
    }
}
