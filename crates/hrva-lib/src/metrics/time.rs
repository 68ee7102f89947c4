use crate::{
    error::Result,
    signal::RRSeries,
    stats::{mean, median, min_max, std_dev},
};
use serde::{Deserialize, Serialize};

/// Time-domain statistics over the whole NN sequence (ms / bpm).
///
/// Successive-difference statistics and `sdnn` need two intervals and are
/// `None` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvTime {
    pub n: usize,
    pub mean_nni: f64,
    pub sdnn: Option<f64>,
    pub sdsd: Option<f64>,
    pub rmssd: Option<f64>,
    pub nni_50: Option<usize>,
    pub pnni_50: Option<f64>,
    pub nni_20: Option<usize>,
    pub pnni_20: Option<f64>,
    pub median_nni: f64,
    pub range_nni: f64,
    pub min_nni: f64,
    pub max_nni: f64,
    pub cvsd: Option<f64>,
    pub cvnni: Option<f64>,
    pub mean_hr: f64,
    pub median_hr: f64,
    pub max_hr: f64,
    pub min_hr: f64,
    pub std_hr: f64,
}

impl HrvTime {
    pub const KEYS: [&'static str; 19] = [
        "mean_nni",
        "sdnn",
        "sdsd",
        "nni_50",
        "pnni_50",
        "nni_20",
        "pnni_20",
        "rmssd",
        "median_nni",
        "range_nni",
        "min_nni",
        "max_nni",
        "cvsd",
        "cvnni",
        "mean_hr",
        "median_hr",
        "max_hr",
        "min_hr",
        "std_hr",
    ];

    pub fn entries(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("mean_nni", Some(self.mean_nni)),
            ("sdnn", self.sdnn),
            ("sdsd", self.sdsd),
            ("nni_50", self.nni_50.map(|c| c as f64)),
            ("pnni_50", self.pnni_50),
            ("nni_20", self.nni_20.map(|c| c as f64)),
            ("pnni_20", self.pnni_20),
            ("rmssd", self.rmssd),
            ("median_nni", Some(self.median_nni)),
            ("range_nni", Some(self.range_nni)),
            ("min_nni", Some(self.min_nni)),
            ("max_nni", Some(self.max_nni)),
            ("cvsd", self.cvsd),
            ("cvnni", self.cvnni),
            ("mean_hr", Some(self.mean_hr)),
            ("median_hr", Some(self.median_hr)),
            ("max_hr", Some(self.max_hr)),
            ("min_hr", Some(self.min_hr)),
            ("std_hr", Some(self.std_hr)),
        ]
    }
}

pub fn hrv_time(nn: &RRSeries) -> Result<HrvTime> {
    nn.validate()?;
    let rr = &nn.rr;
    let n = rr.len();

    // validate() guarantees a non-empty slice, so these are all Some.
    let mean_nni = mean(rr).unwrap_or_default();
    let median_nni = median(rr).unwrap_or_default();
    let (min_nni, max_nni) = min_max(rr).unwrap_or_default();
    let sdnn = std_dev(rr, 1);

    let diffs = nn.diffs();
    let sdsd = std_dev(&diffs, 0);
    let rmssd = mean(&diffs.iter().map(|d| d * d).collect::<Vec<_>>()).map(f64::sqrt);
    let count_above = |limit: f64| {
        (!diffs.is_empty()).then(|| diffs.iter().filter(|d| d.abs() > limit).count())
    };
    let nni_50 = count_above(50.0);
    let nni_20 = count_above(20.0);
    let percent = |count: Option<usize>| count.map(|c| 100.0 * c as f64 / n as f64);

    let hr = nn.heart_rate();
    let (min_hr, max_hr) = min_max(&hr).unwrap_or_default();

    Ok(HrvTime {
        n,
        mean_nni,
        sdnn,
        sdsd,
        rmssd,
        nni_50,
        pnni_50: percent(nni_50),
        nni_20,
        pnni_20: percent(nni_20),
        median_nni,
        range_nni: max_nni - min_nni,
        min_nni,
        max_nni,
        cvsd: rmssd.map(|v| v / mean_nni),
        cvnni: sdnn.map(|v| v / mean_nni),
        mean_hr: mean(&hr).unwrap_or_default(),
        median_hr: median(&hr).unwrap_or_default(),
        max_hr,
        min_hr,
        std_hr: std_dev(&hr, 0).unwrap_or_default(),
    })
}
