//! Ectopic-beat rules. Each rule compares an interval with a reference built
//! only from previously accepted intervals, so a rejected beat never becomes
//! context for the ones after it. For the successive-difference rules the beat
//! after a rejection is accepted as the new reference, so rejections never chain.

use crate::error::{HrvError, Result};
use crate::signal::MaskedRR;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MALIK_MAX_CHANGE: f64 = 0.20;
pub const KAMATH_MAX_INCREASE: f64 = 0.325;
pub const KAMATH_MAX_DECREASE: f64 = 0.245;
pub const KARLSSON_MAX_DEVIATION: f64 = 0.20;
pub const ACAR_MAX_DEVIATION: f64 = 0.20;
pub const ACAR_WINDOW: usize = 9;
pub const CUSTOM_MAX_CHANGE: f64 = 0.20;

/// Ectopic-beat decision rule with its numeric constants.
///
/// Thresholds are fractions of the reference interval:
/// - `Malik`: reject when the change from the previous accepted interval exceeds 20 %.
/// - `Kamath`: reject increases above 32.5 % or decreases above 24.5 % of the previous
///   accepted interval.
/// - `Karlsson`: reject when the deviation from the mean of the previous accepted and
///   the next interval reaches 20 % of that mean.
/// - `Acar`: reject when the deviation from the mean of the accepted intervals among
///   the last 9 positions reaches 20 % of that mean.
/// - `Custom`: Malik's test with a caller-chosen ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase", try_from = "RuleTable")]
pub enum EctopicRule {
    Malik {
        max_change: f64,
    },
    Kamath {
        max_increase: f64,
        max_decrease: f64,
    },
    Karlsson {
        max_deviation: f64,
    },
    Acar {
        max_deviation: f64,
        window: usize,
    },
    Custom {
        max_change: f64,
    },
}

/// Configuration form of a rule: a method name plus optional overrides of its
/// constants. Fields that do not belong to the method are ignored.
#[derive(Debug, Deserialize)]
struct RuleTable {
    method: String,
    max_change: Option<f64>,
    max_increase: Option<f64>,
    max_decrease: Option<f64>,
    max_deviation: Option<f64>,
    window: Option<usize>,
}

impl TryFrom<RuleTable> for EctopicRule {
    type Error = HrvError;

    fn try_from(table: RuleTable) -> Result<Self> {
        Ok(match table.method.parse::<EctopicRule>()? {
            Self::Malik { max_change } => Self::Malik {
                max_change: table.max_change.unwrap_or(max_change),
            },
            Self::Kamath {
                max_increase,
                max_decrease,
            } => Self::Kamath {
                max_increase: table.max_increase.unwrap_or(max_increase),
                max_decrease: table.max_decrease.unwrap_or(max_decrease),
            },
            Self::Karlsson { max_deviation } => Self::Karlsson {
                max_deviation: table.max_deviation.unwrap_or(max_deviation),
            },
            Self::Acar {
                max_deviation,
                window,
            } => Self::Acar {
                max_deviation: table.max_deviation.unwrap_or(max_deviation),
                window: table.window.unwrap_or(window),
            },
            Self::Custom { max_change } => Self::Custom {
                max_change: table.max_change.unwrap_or(max_change),
            },
        })
    }
}

impl Default for EctopicRule {
    fn default() -> Self {
        Self::malik()
    }
}

impl EctopicRule {
    pub const fn malik() -> Self {
        Self::Malik {
            max_change: MALIK_MAX_CHANGE,
        }
    }

    pub const fn kamath() -> Self {
        Self::Kamath {
            max_increase: KAMATH_MAX_INCREASE,
            max_decrease: KAMATH_MAX_DECREASE,
        }
    }

    pub const fn karlsson() -> Self {
        Self::Karlsson {
            max_deviation: KARLSSON_MAX_DEVIATION,
        }
    }

    pub const fn acar() -> Self {
        Self::Acar {
            max_deviation: ACAR_MAX_DEVIATION,
            window: ACAR_WINDOW,
        }
    }

    pub const fn custom(max_change: f64) -> Self {
        Self::Custom { max_change }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Malik { .. } => "malik",
            Self::Kamath { .. } => "kamath",
            Self::Karlsson { .. } => "karlsson",
            Self::Acar { .. } => "acar",
            Self::Custom { .. } => "custom",
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ratios = match self {
            Self::Malik { max_change } | Self::Custom { max_change } => vec![*max_change],
            Self::Kamath {
                max_increase,
                max_decrease,
            } => vec![*max_increase, *max_decrease],
            Self::Karlsson { max_deviation } => vec![*max_deviation],
            Self::Acar {
                max_deviation,
                window,
            } => {
                if *window == 0 {
                    return Err(HrvError::config("acar window must hold at least one beat"));
                }
                vec![*max_deviation]
            }
        };
        if ratios.iter().any(|r| !(r.is_finite() && *r > 0.0)) {
            return Err(HrvError::config(format!(
                "{} thresholds must be positive, got {:?}",
                self.name(),
                ratios
            )));
        }
        Ok(())
    }
}

impl fmt::Display for EctopicRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EctopicRule {
    type Err = HrvError;

    /// Parses a method name into the rule with its published constants.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "malik" => Ok(Self::malik()),
            "kamath" => Ok(Self::kamath()),
            "karlsson" => Ok(Self::karlsson()),
            "acar" | "mean_last9" => Ok(Self::acar()),
            "custom" => Ok(Self::custom(CUSTOM_MAX_CHANGE)),
            other => Err(HrvError::config(format!(
                "unknown ectopic method '{other}', expected malik, kamath, karlsson, acar or custom"
            ))),
        }
    }
}

/// True when `value` deviates from `reference` beyond what `rule` tolerates.
///
/// `reference` is the previous accepted interval for Malik, Kamath and Custom,
/// and the local mean for Karlsson and Acar.
pub fn is_outlier(value: f64, reference: f64, rule: &EctopicRule) -> bool {
    let delta = value - reference;
    match *rule {
        EctopicRule::Malik { max_change } | EctopicRule::Custom { max_change } => {
            delta.abs() > max_change * reference
        }
        EctopicRule::Kamath {
            max_increase,
            max_decrease,
        } => {
            let accepted = (0.0..=max_increase * reference).contains(&delta)
                || (0.0..=max_decrease * reference).contains(&-delta);
            !accepted
        }
        EctopicRule::Karlsson { max_deviation } | EctopicRule::Acar { max_deviation, .. } => {
            delta.abs() >= max_deviation * reference
        }
    }
}

/// Masks ectopic beats according to `rule`; length is preserved.
pub fn remove_ectopic_beats(series: &MaskedRR, rule: &EctopicRule) -> MaskedRR {
    let out = match rule {
        EctopicRule::Karlsson { .. } => karlsson_pass(series, rule),
        EctopicRule::Acar { .. } => mean_last_pass(series, rule),
        _ => previous_accepted_pass(series, rule),
    };
    let removed = out.missing_count().saturating_sub(series.missing_count());
    log::info!("{removed} ectopic beat(s) removed with {rule} rule");
    out
}

/// Karlsson's rule on its own, with `removing_rule` as the tolerated fraction.
pub fn remove_outlier_karlsson(series: &MaskedRR, removing_rule: f64) -> MaskedRR {
    remove_ectopic_beats(
        series,
        &EctopicRule::Karlsson {
            max_deviation: removing_rule,
        },
    )
}

/// Mean-of-last-9 rule (Acar) on its own, with `removing_rule` as the tolerated fraction.
pub fn remove_outlier_mean_last9(series: &MaskedRR, removing_rule: f64) -> MaskedRR {
    remove_ectopic_beats(
        series,
        &EctopicRule::Acar {
            max_deviation: removing_rule,
            window: ACAR_WINDOW,
        },
    )
}

fn previous_accepted_pass(series: &MaskedRR, rule: &EctopicRule) -> MaskedRR {
    let mut last: Option<f64> = None;
    let mut after_rejection = false;
    let samples = series
        .samples
        .iter()
        .map(|sample| {
            let value = (*sample)?;
            match last {
                Some(prev) if !after_rejection && is_outlier(value, prev, rule) => {
                    after_rejection = true;
                    None
                }
                _ => {
                    after_rejection = false;
                    last = Some(value);
                    Some(value)
                }
            }
        })
        .collect();
    MaskedRR { samples }
}

fn karlsson_pass(series: &MaskedRR, rule: &EctopicRule) -> MaskedRR {
    let input = &series.samples;
    let mut last: Option<f64> = None;
    let mut samples = Vec::with_capacity(input.len());
    for (i, sample) in input.iter().enumerate() {
        let Some(value) = *sample else {
            samples.push(None);
            continue;
        };
        let next = input[i + 1..].iter().flatten().next().copied();
        let keep = match (last, next) {
            (Some(prev), Some(next)) => !is_outlier(value, (prev + next) / 2.0, rule),
            _ => true,
        };
        if keep {
            last = Some(value);
            samples.push(Some(value));
        } else {
            samples.push(None);
        }
    }
    MaskedRR { samples }
}

fn mean_last_pass(series: &MaskedRR, rule: &EctopicRule) -> MaskedRR {
    let window = match *rule {
        EctopicRule::Acar { window, .. } => window,
        _ => ACAR_WINDOW,
    };
    let mut samples: Vec<Option<f64>> = Vec::with_capacity(series.len());
    for (i, sample) in series.samples.iter().enumerate() {
        let Some(value) = *sample else {
            samples.push(None);
            continue;
        };
        if i < window {
            samples.push(Some(value));
            continue;
        }
        let context: Vec<f64> = samples[i - window..i].iter().flatten().copied().collect();
        let keep = match crate::stats::mean(&context) {
            Some(local_mean) => !is_outlier(value, local_mean, rule),
            None => true,
        };
        samples.push(keep.then_some(value));
    }
    MaskedRR { samples }
}
