//! # Pitch Detection Module
//!
//! This module implements the autocorrelation pitch estimator used by the
//! tuner. It turns one frame of time-domain samples into a fundamental
//! frequency, or reports that the frame carries no usable pitch.
//!
//! ## Features
//! - RMS silence gate
//! - Edge trimming of high-amplitude leading and trailing samples
//! - Time-domain autocorrelation with a single scratch buffer
//! - First-peak lag selection past the zero-lag maximum
//!
//! Resolution is limited to whole lags; no interpolation is performed
//! between neighbouring correlation bins.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::autocorr::autocorr_conv;
use crate::config::EstimatorConfig;
use crate::error::{TunerError, TunerResult};
use crate::observer::{EstimateObserver, FrameDiagnostics};

/// Frames shorter than this cannot contain a period.
const MIN_FRAME_LEN: usize = 2;

/// Sample rate of an audio session in Hz. Always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SampleRate(u32);

impl SampleRate {
    /// Creates a sample rate, rejecting zero.
    pub fn new(rate: u32) -> TunerResult<Self> {
        if rate == 0 {
            Err(TunerError::InvalidSampleRate { rate })
        } else {
            Ok(Self(rate))
        }
    }

    pub fn hz(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = TunerError;

    fn try_from(rate: u32) -> TunerResult<Self> {
        Self::new(rate)
    }
}

impl From<SampleRate> for u32 {
    fn from(rate: SampleRate) -> u32 {
        rate.0
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// Outcome of estimating one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrequencyEstimate {
    /// A periodic signal was found at this frequency in Hz. Always positive.
    Voiced(f32),
    /// Silence, or no periodicity could be determined.
    NoSignal,
}

impl FrequencyEstimate {
    /// Returns the frequency in Hz for voiced frames.
    pub fn hz(self) -> Option<f32> {
        match self {
            FrequencyEstimate::Voiced(hz) => Some(hz),
            FrequencyEstimate::NoSignal => None,
        }
    }

    pub fn is_voiced(self) -> bool {
        matches!(self, FrequencyEstimate::Voiced(_))
    }
}

/// Autocorrelation pitch estimator.
///
/// The estimator holds only its configuration. Every call is independent
/// and the same frame always yields the same estimate, so one instance can
/// be shared freely between threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchEstimator {
    config: EstimatorConfig,
}

impl PitchEstimator {
    /// Creates an estimator after validating `config`.
    pub fn new(config: EstimatorConfig) -> TunerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimates the fundamental frequency of `samples`.
    ///
    /// Allocates one scratch buffer the size of the trimmed frame. Use
    /// [`estimate_with_scratch`](Self::estimate_with_scratch) to reuse a
    /// buffer across frames.
    ///
    /// # Arguments
    /// * `samples` - One frame of time-domain audio, nominally in [-1, 1]
    /// * `sample_rate` - Sample rate of the frame
    ///
    /// # Returns
    /// * `Voiced(hz)` - Detected fundamental frequency
    /// * `NoSignal` - Silence, a frame shorter than two samples, or no peak
    pub fn estimate(&self, samples: &[f32], sample_rate: SampleRate) -> FrequencyEstimate {
        let mut scratch = Vec::new();
        self.run(samples, sample_rate, &mut scratch, None)
    }

    /// Same as [`estimate`](Self::estimate), correlating into `scratch`.
    ///
    /// `scratch` is resized to the trimmed frame length. Once its capacity
    /// covers the window size no further allocation takes place.
    pub fn estimate_with_scratch(
        &self,
        samples: &[f32],
        sample_rate: SampleRate,
        scratch: &mut Vec<f32>,
    ) -> FrequencyEstimate {
        self.run(samples, sample_rate, scratch, None)
    }

    /// Same as [`estimate_with_scratch`](Self::estimate_with_scratch), and
    /// reports the intermediate values to `observer`.
    pub fn estimate_observed(
        &self,
        samples: &[f32],
        sample_rate: SampleRate,
        scratch: &mut Vec<f32>,
        observer: &mut dyn EstimateObserver,
    ) -> FrequencyEstimate {
        self.run(samples, sample_rate, scratch, Some(observer))
    }

    fn run(
        &self,
        samples: &[f32],
        sample_rate: SampleRate,
        scratch: &mut Vec<f32>,
        observer: Option<&mut dyn EstimateObserver>,
    ) -> FrequencyEstimate {
        let mut diagnostics = FrameDiagnostics {
            frame_len: samples.len(),
            rms: rms(samples),
            trimmed: None,
            descent_lag: None,
            best_lag: None,
            estimate: FrequencyEstimate::NoSignal,
        };

        self.analyse(samples, sample_rate, scratch, &mut diagnostics);

        if let Some(observer) = observer {
            observer.on_frame(&diagnostics);
        }
        diagnostics.estimate
    }

    /// Runs the estimation steps, recording each one in `d`.
    fn analyse(
        &self,
        samples: &[f32],
        sample_rate: SampleRate,
        scratch: &mut Vec<f32>,
        d: &mut FrameDiagnostics,
    ) {
        // --- Noise Gate ---
        // A NaN RMS compares false against the threshold, so check finiteness too.
        if samples.len() < MIN_FRAME_LEN
            || !d.rms.is_finite()
            || d.rms < self.config.silence_threshold
        {
            return;
        }

        // --- Edge Trimming ---
        let range = trim_range(samples, self.config.trim_threshold);
        d.trimmed = Some(range.clone());
        if range.is_empty() {
            return;
        }
        let trimmed = &samples[range];

        // --- Autocorrelation over every lag of the trimmed frame ---
        scratch.clear();
        scratch.resize(trimmed.len(), 0.0);
        autocorr_conv(trimmed, scratch);

        // --- Skip the zero-lag peak, then take the highest remaining lag ---
        let descent = descend_from_zero_lag(scratch);
        d.descent_lag = Some(descent);
        let best_lag = match peak_lag(scratch, descent) {
            Some(lag) if lag > 0 => lag,
            other => {
                d.best_lag = other;
                return;
            }
        };
        d.best_lag = Some(best_lag);

        d.estimate = FrequencyEstimate::Voiced(sample_rate.hz() as f32 / best_lag as f32);
    }
}

/// Estimates the pitch of `samples` with the default thresholds.
pub fn estimate_pitch(samples: &[f32], sample_rate: SampleRate) -> FrequencyEstimate {
    PitchEstimator::default().estimate(samples, sample_rate)
}

/// Root-mean-square amplitude of `samples`. Zero for an empty slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Finds the part of the frame left after trimming loud edges.
///
/// The start is the first index in the first half of the frame whose
/// absolute amplitude is below `threshold`, or 0 if there is none. The end
/// (exclusive) is the last such index scanning backwards through the second
/// half, or `len - 1` if there is none.
pub fn trim_range(samples: &[f32], threshold: f32) -> Range<usize> {
    let n = samples.len();
    let in_first_half = |i: &usize| 2 * i < n;

    let start = (0..n)
        .take_while(in_first_half)
        .find(|&i| samples[i].abs() < threshold)
        .unwrap_or(0);
    let end = (1..n)
        .take_while(in_first_half)
        .find(|&i| samples[n - i].abs() < threshold)
        .map(|i| n - i)
        .unwrap_or(n.saturating_sub(1));

    start..end.max(start)
}

/// Walks down the slope after lag 0 while the correlation keeps falling.
fn descend_from_zero_lag(correlations: &[f32]) -> usize {
    let mut lag = 0;
    while lag + 1 < correlations.len() && correlations[lag] > correlations[lag + 1] {
        lag += 1;
    }
    lag
}

/// Lag of the largest correlation at or after `from`. Ties keep the lowest lag.
fn peak_lag(correlations: &[f32], from: usize) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (lag, &value) in correlations.iter().enumerate().skip(from) {
        if best.map_or(true, |(_, max)| value > max) {
            best = Some((lag, value));
        }
    }
    best.map(|(lag, _)| lag)
}
