//! # Estimator Configuration
//!
//! Tunable thresholds for the autocorrelation estimator. The defaults
//! reproduce the tuner's historical behaviour and should only change
//! when there is evidence a different gate works better.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{TunerError, TunerResult};

/// Default RMS level below which a frame is treated as silence.
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.01;

/// Default absolute amplitude used to trim the frame edges.
pub const DEFAULT_TRIM_THRESHOLD: f32 = 0.5;

/// Thresholds used by [`PitchEstimator`](crate::PitchEstimator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Frames whose RMS amplitude is below this value report no signal.
    pub silence_threshold: f32,
    /// Leading and trailing samples at or above this absolute amplitude
    /// are trimmed before correlating.
    pub trim_threshold: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            trim_threshold: DEFAULT_TRIM_THRESHOLD,
        }
    }
}

impl EstimatorConfig {
    /// Checks that both thresholds are finite and non-negative.
    pub fn validate(&self) -> TunerResult<()> {
        check_threshold("silence_threshold", self.silence_threshold)?;
        check_threshold("trim_threshold", self.trim_threshold)?;
        Ok(())
    }

    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults. The loaded values are
    /// validated before being returned.
    pub fn load(path: impl AsRef<Path>) -> TunerResult<Self> {
        let mut file = File::open(path)?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let config: EstimatorConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> TunerResult<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }
}

fn check_threshold(name: &'static str, value: f32) -> TunerResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TunerError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_historical_gates() {
        let config = EstimatorConfig::default();
        assert_eq!(config.silence_threshold, 0.01);
        assert_eq!(config.trim_threshold, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: EstimatorConfig = serde_json::from_str(r#"{ "trim_threshold": 0.3 }"#).unwrap();
        assert_eq!(config.trim_threshold, 0.3);
        assert_eq!(config.silence_threshold, DEFAULT_SILENCE_THRESHOLD);
    }

    #[test]
    fn rejects_bad_thresholds() {
        let negative = EstimatorConfig {
            silence_threshold: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(TunerError::InvalidThreshold { name: "silence_threshold", .. })
        ));

        let nan = EstimatorConfig {
            trim_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(TunerError::InvalidThreshold { name: "trim_threshold", .. })
        ));
    }

    #[test]
    fn save_then_load_from_disk() {
        let file_name = format!("chromatic-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(file_name);
        let config = EstimatorConfig {
            silence_threshold: 0.02,
            trim_threshold: 0.4,
        };
        config.save(&path).unwrap();
        let loaded = EstimatorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_reports_missing_file() {
        let result = EstimatorConfig::load("/nonexistent/chromatic/config.json");
        assert!(matches!(result, Err(TunerError::Io(_))));
    }
}
