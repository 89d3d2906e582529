// chromatic-core/src/lib.rs

//! The core logic for the chromatic tuner.
//! This crate is responsible for pitch estimation and note naming.
//! It is completely headless: it performs no audio capture, no
//! scheduling and no logging of its own. A shell feeds it fixed-size
//! frames of samples and renders the returned readings.

pub mod autocorr;
pub mod config;
pub mod error;
pub mod framing;
pub mod observer;
pub mod pitch;
pub mod session;
pub mod tuning;

pub use config::EstimatorConfig;
pub use error::{TunerError, TunerResult};
pub use framing::{FrameAccumulator, DEFAULT_WINDOW_SIZE};
pub use observer::{EstimateObserver, FrameDiagnostics, LogObserver};
pub use pitch::{estimate_pitch, FrequencyEstimate, PitchEstimator, SampleRate};
pub use session::{Reading, Tuner};
pub use tuning::{cents_deviation, nearest_note, note_name_for, NoteName, PitchClass};
