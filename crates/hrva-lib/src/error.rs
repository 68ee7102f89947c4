use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the cleaning pipeline and the feature extractors.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum HrvError {
    /// Sequence is empty, holds non-positive or non-finite values, or is too short.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Every sample was rejected, nothing is left to interpolate from.
    #[error("all samples are missing, cannot interpolate")]
    AllMissing,
    /// Unknown method name, bad band definition or non-positive parameter.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// FFT backend failure.
    #[error("spectral estimation failed: {0}")]
    Spectral(String),
}

impl HrvError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HrvError>;
