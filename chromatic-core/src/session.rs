//! # Tuner Session Module
//!
//! A tick-driven wrapper around the estimator and note mapper. The shell
//! owns timing: it calls [`Tuner::process`] once per captured frame, from
//! a timer, an audio callback or a plain loop, and renders the returned
//! [`Reading`].

use std::fmt;

use serde::Serialize;

use crate::config::EstimatorConfig;
use crate::error::TunerResult;
use crate::observer::EstimateObserver;
use crate::pitch::{FrequencyEstimate, PitchEstimator, SampleRate};
use crate::tuning::{self, NoteName};

/// Label shown before the tuner has been started.
pub const IDLE_LABEL: &str = "Waiting for input...";

/// Label shown for frames without a detectable pitch.
pub const NO_SIGNAL_LABEL: &str = "No signal";

/// Represents the result of analysing a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    /// False when the tuner was stopped and the frame was not analysed.
    pub active: bool,
    /// The detected frequency in Hz.
    pub frequency: Option<f32>,
    /// The name of the nearest note.
    pub note: Option<NoteName>,
    /// The deviation from the nearest note in cents.
    pub cents_deviation: Option<f32>,
}

impl Reading {
    /// Reading for a stopped tuner.
    pub fn idle() -> Self {
        Self {
            active: false,
            frequency: None,
            note: None,
            cents_deviation: None,
        }
    }

    /// Builds the reading for one estimate.
    pub fn from_estimate(estimate: FrequencyEstimate) -> Self {
        let frequency = estimate.hz();
        let nearest = frequency.and_then(tuning::nearest_note);
        Self {
            active: true,
            frequency,
            note: nearest.map(|(note, _)| note),
            cents_deviation: frequency
                .zip(nearest)
                .map(|(freq, (_, target))| tuning::cents_deviation(freq, target)),
        }
    }

    /// The user-facing label: a note name, "No signal" or the idle prompt.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.active, self.note) {
            (false, _) => f.write_str(IDLE_LABEL),
            (true, Some(note)) => write!(f, "{}", note),
            (true, None) => f.write_str(NO_SIGNAL_LABEL),
        }
    }
}

/// Tuner state for one audio session.
///
/// Holds the estimator, the session's sample rate, a reusable correlation
/// buffer and an optional observer. Nothing about previous frames is
/// remembered: every reading depends only on the frame passed in.
pub struct Tuner {
    estimator: PitchEstimator,
    sample_rate: SampleRate,
    scratch: Vec<f32>,
    observer: Option<Box<dyn EstimateObserver + Send>>,
    running: bool,
}

impl fmt::Debug for Tuner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tuner")
            .field("estimator", &self.estimator)
            .field("sample_rate", &self.sample_rate)
            .field("has_observer", &self.observer.is_some())
            .field("running", &self.running)
            .finish()
    }
}

impl Tuner {
    /// Creates a stopped tuner.
    pub fn new(config: EstimatorConfig, sample_rate: SampleRate) -> TunerResult<Self> {
        Ok(Self {
            estimator: PitchEstimator::new(config)?,
            sample_rate,
            scratch: Vec::new(),
            observer: None,
            running: false,
        })
    }

    /// Attaches an observer that receives the diagnostics of every analysed frame.
    pub fn with_observer(mut self, observer: Box<dyn EstimateObserver + Send>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    pub fn estimator(&self) -> &PitchEstimator {
        &self.estimator
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Analyses one frame.
    ///
    /// A stopped tuner returns [`Reading::idle`] without looking at the frame.
    pub fn process(&mut self, frame: &[f32]) -> Reading {
        if !self.running {
            return Reading::idle();
        }

        let estimate = match self.observer.as_deref_mut() {
            Some(observer) => self.estimator.estimate_observed(
                frame,
                self.sample_rate,
                &mut self.scratch,
                observer,
            ),
            None => self
                .estimator
                .estimate_with_scratch(frame, self.sample_rate, &mut self.scratch),
        };
        Reading::from_estimate(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn tone(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.8 * (2.0 * std::f32::consts::PI * freq * i as f32 / 44_100.0).sin())
            .collect()
    }

    fn tuner() -> Tuner {
        Tuner::new(EstimatorConfig::default(), SampleRate::new(44_100).unwrap()).unwrap()
    }

    #[test]
    fn stopped_tuner_is_idle() {
        let mut tuner = tuner();
        let reading = tuner.process(&tone(440.0, 2048));
        assert_eq!(reading, Reading::idle());
        assert_eq!(reading.label(), IDLE_LABEL);
    }

    #[test]
    fn running_tuner_names_the_note() {
        let mut tuner = tuner();
        tuner.start();
        let reading = tuner.process(&tone(220.0, 2048));
        assert!(reading.active);
        assert_eq!(reading.label(), "A3");
        assert!(reading.cents_deviation.unwrap().abs() < 50.0);
    }

    #[test]
    fn silence_reads_no_signal() {
        let mut tuner = tuner();
        tuner.start();
        let reading = tuner.process(&[0.0; 2048]);
        assert_eq!(reading.frequency, None);
        assert_eq!(reading.cents_deviation, None);
        assert_eq!(reading.label(), NO_SIGNAL_LABEL);
    }

    #[test]
    fn stop_returns_to_idle() {
        let mut tuner = tuner();
        tuner.start();
        assert!(tuner.process(&tone(440.0, 2048)).active);
        tuner.stop();
        assert!(!tuner.is_running());
        assert_eq!(tuner.process(&tone(440.0, 2048)).label(), IDLE_LABEL);
    }

    #[test]
    fn observer_only_sees_analysed_frames() {
        let count = Arc::new(Mutex::new(0usize));
        let seen = Arc::clone(&count);
        let mut tuner = tuner().with_observer(Box::new(move |_: &crate::FrameDiagnostics| {
            *seen.lock().unwrap() += 1;
        }));

        tuner.process(&tone(440.0, 1024));
        tuner.start();
        tuner.process(&tone(440.0, 1024));
        tuner.process(&[0.0; 1024]);
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn readings_serialize_to_json() {
        let reading = Reading::from_estimate(FrequencyEstimate::Voiced(440.0));
        let json = serde_json::to_value(reading).unwrap();
        assert_eq!(json["frequency"], 440.0);
        assert_eq!(json["note"]["pitch_class"], "A");
        assert_eq!(json["note"]["octave"], 4);
        assert_eq!(json["cents_deviation"], 0.0);
    }
}
