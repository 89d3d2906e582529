//! Error types for the tuner core.

use thiserror::Error;

/// Result type for fallible tuner operations.
pub type TunerResult<T> = Result<T, TunerError>;

/// Errors that can occur while configuring the tuner.
///
/// Pitch estimation itself never fails: an unvoiced frame is reported as
/// [`FrequencyEstimate::NoSignal`](crate::FrequencyEstimate::NoSignal).
#[derive(Debug, Error)]
pub enum TunerError {
    /// Sample rate of zero.
    #[error("invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate.
        rate: u32,
    },

    /// Threshold that is negative or not finite.
    #[error("invalid threshold '{name}': {value}")]
    InvalidThreshold {
        /// Config field name.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// Analysis window of zero samples.
    #[error("invalid window size: {size}")]
    InvalidWindowSize {
        /// The rejected size.
        size: usize,
    },

    /// I/O error while reading or writing a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed config JSON.
    #[error("config format error: {0}")]
    Json(#[from] serde_json::Error),
}
