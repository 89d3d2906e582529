//! # Estimation Observers
//!
//! Hook for inspecting what the estimator did with each frame. The core
//! never prints or logs by itself; a shell that wants tracing attaches an
//! observer, for example [`LogObserver`].

use std::ops::Range;

use crate::pitch::FrequencyEstimate;

/// Intermediate values computed while estimating one frame.
///
/// Fields after `rms` are `None` when the estimator stopped before
/// reaching the corresponding step.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDiagnostics {
    /// Number of samples in the frame.
    pub frame_len: usize,
    /// Root-mean-square amplitude of the whole frame.
    pub rms: f32,
    /// Sample range kept after edge trimming.
    pub trimmed: Option<Range<usize>>,
    /// Lag at which the descent from the zero-lag peak stopped.
    pub descent_lag: Option<usize>,
    /// Lag with the highest correlation after the descent.
    pub best_lag: Option<usize>,
    /// Final outcome for the frame.
    pub estimate: FrequencyEstimate,
}

/// Receives diagnostics once per estimated frame.
pub trait EstimateObserver {
    fn on_frame(&mut self, diagnostics: &FrameDiagnostics);
}

impl<F> EstimateObserver for F
where
    F: FnMut(&FrameDiagnostics),
{
    fn on_frame(&mut self, diagnostics: &FrameDiagnostics) {
        self(diagnostics)
    }
}

/// Forwards frame diagnostics to the `log` facade.
///
/// Voiced frames are logged at debug level and unvoiced frames at trace
/// level, so a shell running at `debug` sees only detected pitches.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl EstimateObserver for LogObserver {
    fn on_frame(&mut self, d: &FrameDiagnostics) {
        match d.estimate {
            FrequencyEstimate::Voiced(hz) => log::debug!(
                "frame len={} rms={:.4} trimmed={:?} lag={:?} -> {:.2} Hz",
                d.frame_len,
                d.rms,
                d.trimmed,
                d.best_lag,
                hz
            ),
            FrequencyEstimate::NoSignal => log::trace!(
                "frame len={} rms={:.4} trimmed={:?} descent={:?} lag={:?} -> no signal",
                d.frame_len,
                d.rms,
                d.trimmed,
                d.descent_lag,
                d.best_lag
            ),
        }
    }
}
