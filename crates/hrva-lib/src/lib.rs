//! RR-interval cleaning and heart rate variability features.

pub mod config;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod signal;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::*;
pub use detectors::*;
pub use error::{HrvError, Result};
pub use metrics::*;
pub use signal::*;
