//! Fitbit vendor adapter
//!
//! Parses Fitbit Web API payloads and maps them to canonical samples.

use crate::error::ComputeError;
use crate::types::{HeartRateSample, SleepRecord, SleepStage, SleepStageInterval, Vendor};
use serde::Deserialize;

use super::VendorPayloadAdapter;

/// Fitbit payload adapter
pub struct FitbitAdapter;

impl VendorPayloadAdapter for FitbitAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Fitbit
    }

    fn parse_sleep(&self, raw_json: &str) -> Result<Vec<SleepRecord>, ComputeError> {
        let payload: FitbitSleepPayload = serde_json::from_str(raw_json)?;
        let logs = payload.sleep.ok_or_else(|| {
            ComputeError::MalformedPayload("sleep payload has no `sleep` array".to_string())
        })?;

        logs.into_iter().map(convert_sleep_log).collect()
    }

    fn parse_heart_rate(&self, raw_json: &str) -> Result<Vec<HeartRateSample>, ComputeError> {
        let payload: FitbitHeartPayload = serde_json::from_str(raw_json)?;

        // A day without intraday data arrives without the block; the estimator
        // reports that as an empty series.
        Ok(payload
            .intraday
            .map(|intraday| {
                intraday
                    .dataset
                    .into_iter()
                    .map(|point| HeartRateSample {
                        time: point.time,
                        value: point.value,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn parse_rr_intervals(&self, raw_json: &str) -> Result<Vec<f64>, ComputeError> {
        let payload: FitbitHrvPayload = serde_json::from_str(raw_json)?;
        Ok(payload.rr_intervals)
    }
}

fn convert_sleep_log(log: FitbitSleepLog) -> Result<SleepRecord, ComputeError> {
    let (stage_summary, entries) = match log.levels {
        Some(levels) => (levels.summary, levels.data),
        None => (None, None),
    };

    let intervals = entries
        .map(|entries| {
            entries
                .into_iter()
                .map(convert_level_entry)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    Ok(SleepRecord {
        duration_ms: log.duration,
        efficiency: log.efficiency,
        stage_summary,
        intervals,
    })
}

fn convert_level_entry(entry: FitbitLevelEntry) -> Result<SleepStageInterval, ComputeError> {
    if !(entry.seconds.is_finite() && entry.seconds >= 0.0) {
        return Err(ComputeError::MalformedPayload(format!(
            "sleep level duration must be non-negative, got {}",
            entry.seconds
        )));
    }
    if !(entry.breaths.is_finite() && entry.breaths >= 0.0) {
        return Err(ComputeError::MalformedPayload(format!(
            "breath count must be non-negative, got {}",
            entry.breaths
        )));
    }

    Ok(SleepStageInterval::new(entry.level, entry.seconds, entry.breaths))
}

// Fitbit API response structures

#[derive(Debug, Deserialize)]
struct FitbitSleepPayload {
    sleep: Option<Vec<FitbitSleepLog>>,
}

#[derive(Debug, Deserialize)]
struct FitbitSleepLog {
    /// Milliseconds
    duration: Option<f64>,
    efficiency: Option<serde_json::Number>,
    levels: Option<FitbitLevels>,
}

#[derive(Debug, Deserialize)]
struct FitbitLevels {
    summary: Option<serde_json::Value>,
    data: Option<Vec<FitbitLevelEntry>>,
}

#[derive(Debug, Deserialize)]
struct FitbitLevelEntry {
    level: SleepStage,
    seconds: f64,
    #[serde(default)]
    breaths: f64,
}

#[derive(Debug, Deserialize)]
struct FitbitHeartPayload {
    #[serde(rename = "activities-heart-intraday")]
    intraday: Option<FitbitHeartIntraday>,
}

#[derive(Debug, Deserialize)]
struct FitbitHeartIntraday {
    #[serde(default)]
    dataset: Vec<FitbitHeartPoint>,
}

#[derive(Debug, Deserialize)]
struct FitbitHeartPoint {
    time: String,
    value: serde_json::Number,
}

#[derive(Debug, Deserialize)]
struct FitbitHrvPayload {
    #[serde(default)]
    rr_intervals: Vec<f64>,
}
