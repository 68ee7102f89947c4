//! Synthetic tachograms shared by unit tests.

use crate::signal::RRSeries;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;

/// Intervals oscillating at `freq` Hz (in beat time) around 800 ms.
pub fn modulated_rr(freq: f64, amplitude: f64, beats: usize) -> RRSeries {
    let mut t = 0.0;
    let mut rr = Vec::with_capacity(beats);
    for _ in 0..beats {
        let value = 800.0 + amplitude * (2.0 * PI * freq * t).sin();
        rr.push(value);
        t += value / 1000.0;
    }
    RRSeries::new(rr)
}

/// Mean-reverting random walk around `center` ms, reproducible from `seed`.
pub fn noisy_rr(seed: u64, center: f64, beats: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut current = center;
    (0..beats)
        .map(|_| {
            current = center + 0.8 * (current - center) + rng.gen_range(-15.0..15.0);
            current
        })
        .collect()
}
