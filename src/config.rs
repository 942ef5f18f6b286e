//! Engine configuration
//!
//! Tunables for the metric components. Every field has a default, so a config
//! file only needs to name what it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ComputeError;

/// Expected intervals per day (24 hours of one-minute intervals)
pub const DEFAULT_EXPECTED_DAILY_INTERVALS: f64 = 1440.0;

/// Upper bound on Welch segment length
pub const DEFAULT_MAX_SEGMENT_LENGTH: usize = 256;

/// Low-frequency HRV band (Hz)
pub const LF_BAND: FrequencyBand = FrequencyBand {
    low_hz: 0.04,
    high_hz: 0.15,
};

/// High-frequency HRV band (Hz)
pub const HF_BAND: FrequencyBand = FrequencyBand {
    low_hz: 0.15,
    high_hz: 0.40,
};

/// Inclusive frequency range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

/// HRV analyzer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrvConfig {
    /// Denominator of the coverage percentage
    pub expected_daily_intervals: f64,
    /// Welch segment length cap
    pub max_segment_length: usize,
    pub lf_band: FrequencyBand,
    pub hf_band: FrequencyBand,
}

impl Default for HrvConfig {
    fn default() -> Self {
        Self {
            expected_daily_intervals: DEFAULT_EXPECTED_DAILY_INTERVALS,
            max_segment_length: DEFAULT_MAX_SEGMENT_LENGTH,
            lf_band: LF_BAND,
            hf_band: HF_BAND,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub hrv: HrvConfig,
}

impl MetricsConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: MetricsConfig = serde_json::from_str(json)
            .map_err(|e| ComputeError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_path(path: &Path) -> Result<Self, ComputeError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ComputeError::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(ComputeError::JsonError)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        let hrv = &self.hrv;
        if !(hrv.expected_daily_intervals.is_finite() && hrv.expected_daily_intervals > 0.0) {
            return Err(ComputeError::ConfigError(
                "hrv.expected_daily_intervals must be positive".to_string(),
            ));
        }
        if hrv.max_segment_length < 2 {
            return Err(ComputeError::ConfigError(
                "hrv.max_segment_length must be at least 2".to_string(),
            ));
        }
        for (name, band) in [("lf_band", hrv.lf_band), ("hf_band", hrv.hf_band)] {
            if !(band.low_hz >= 0.0 && band.low_hz < band.high_hz) {
                return Err(ComputeError::ConfigError(format!(
                    "hrv.{name} must satisfy 0 <= low_hz < high_hz"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = MetricsConfig::default();
        assert_eq!(config.hrv.expected_daily_intervals, 1440.0);
        assert_eq!(config.hrv.max_segment_length, 256);
        assert_eq!(config.hrv.lf_band, LF_BAND);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let config = MetricsConfig::from_json(r#"{"hrv": {"expected_daily_intervals": 720}}"#)
            .unwrap();
        assert_eq!(config.hrv.expected_daily_intervals, 720.0);
        assert_eq!(config.hrv.hf_band, HF_BAND);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(MetricsConfig::from_json(r#"{"hrv": {"max_segment_length": 1}}"#).is_err());
        assert!(MetricsConfig::from_json(
            r#"{"hrv": {"lf_band": {"low_hz": 0.2, "high_hz": 0.1}}}"#
        )
        .is_err());
        assert!(MetricsConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_round_trip_through_file() {
        let mut config = MetricsConfig::default();
        config.hrv.max_segment_length = 128;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();

        let loaded = MetricsConfig::from_path(file.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
