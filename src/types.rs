//! Core types for the Synheart Vitals engine
//!
//! This module defines the data structures that flow through the engine:
//! canonical samples and sleep records produced by vendor adapters, and the
//! metric records returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ComputeError;
use uuid::Uuid;

/// Vendor identifier for provenance tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Fitbit,
}

impl Vendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Fitbit => "fitbit",
        }
    }
}

/// Metric category a payload belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataScope {
    UserInfo,
    Sleep,
    HeartRate,
    Hrv,
    BreathingRate,
    Spo2,
    Activity,
}

impl DataScope {
    pub const ALL: [DataScope; 7] = [
        DataScope::UserInfo,
        DataScope::Sleep,
        DataScope::HeartRate,
        DataScope::Hrv,
        DataScope::BreathingRate,
        DataScope::Spo2,
        DataScope::Activity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataScope::UserInfo => "user_info",
            DataScope::Sleep => "sleep",
            DataScope::HeartRate => "heart_rate",
            DataScope::Hrv => "hrv",
            DataScope::BreathingRate => "breathing_rate",
            DataScope::Spo2 => "spo2",
            DataScope::Activity => "activity",
        }
    }
}

impl fmt::Display for DataScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataScope {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        DataScope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == normalized)
            .ok_or_else(|| ComputeError::UnsupportedScope(s.to_string()))
    }
}

/// Sleep stage classification
///
/// Labels outside the four known stages deserialize to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepStage {
    Deep,
    Light,
    Rem,
    Wake,
    #[serde(other)]
    Unknown,
}

/// One contiguous interval spent in a single sleep stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepStageInterval {
    pub stage: SleepStage,
    /// Interval length (seconds, non-negative)
    pub duration_seconds: f64,
    /// Breaths counted during the interval (0 when the vendor omits it)
    pub breath_count: f64,
}

impl SleepStageInterval {
    pub fn new(stage: SleepStage, duration_seconds: f64, breath_count: f64) -> Self {
        Self {
            stage,
            duration_seconds,
            breath_count,
        }
    }
}

/// A single vendor sleep log (main sleep or nap)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    /// Total record duration (milliseconds)
    pub duration_ms: Option<f64>,
    /// Vendor sleep efficiency (0-100), in the vendor's numeric form
    pub efficiency: Option<serde_json::Number>,
    /// Vendor per-stage summary, passed through untouched
    pub stage_summary: Option<serde_json::Value>,
    /// Stage intervals; `None` when the record carries no `levels.data`
    pub intervals: Option<Vec<SleepStageInterval>>,
}

/// Intraday heart-rate sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Vendor timestamp, kept opaque ("HH:MM:SS" for Fitbit)
    pub time: String,
    /// Beats per minute, in the vendor's numeric form
    pub value: serde_json::Number,
}

impl HeartRateSample {
    /// Beats per minute as a float; NaN if the number has no f64 form
    pub fn bpm(&self) -> f64 {
        self.value.as_f64().unwrap_or(f64::NAN)
    }
}

/// Heart-rate sample as reported back to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRatePoint {
    pub time: String,
    pub heart_rate: serde_json::Number,
}

/// A value for each known sleep stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageValues {
    pub deep: f64,
    pub light: f64,
    pub rem: f64,
    pub wake: f64,
}

impl StageValues {
    pub fn get(&self, stage: SleepStage) -> Option<f64> {
        match stage {
            SleepStage::Deep => Some(self.deep),
            SleepStage::Light => Some(self.light),
            SleepStage::Rem => Some(self.rem),
            SleepStage::Wake => Some(self.wake),
            SleepStage::Unknown => None,
        }
    }

    pub fn get_mut(&mut self, stage: SleepStage) -> Option<&mut f64> {
        match stage {
            SleepStage::Deep => Some(&mut self.deep),
            SleepStage::Light => Some(&mut self.light),
            SleepStage::Rem => Some(&mut self.rem),
            SleepStage::Wake => Some(&mut self.wake),
            SleepStage::Unknown => None,
        }
    }

    /// Build from a per-stage function
    pub fn from_fn(mut f: impl FnMut(SleepStage) -> f64) -> Self {
        Self {
            deep: f(SleepStage::Deep),
            light: f(SleepStage::Light),
            rem: f(SleepStage::Rem),
            wake: f(SleepStage::Wake),
        }
    }

    pub fn sum(&self) -> f64 {
        self.deep + self.light + self.rem + self.wake
    }
}

/// Spectral band power, or a marker when the series was too short to analyze
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandPower {
    Measured(f64),
    InsufficientData,
}

impl BandPower {
    pub fn value(&self) -> Option<f64> {
        match self {
            BandPower::Measured(v) => Some(*v),
            BandPower::InsufficientData => None,
        }
    }
}

impl Serialize for BandPower {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BandPower::Measured(v) => serializer.serialize_f64(*v),
            BandPower::InsufficientData => serializer.serialize_str("insufficient_data"),
        }
    }
}

/// Sleep summary for the primary sleep record of a date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepMetrics {
    pub query_date: String,
    pub duration_minutes: f64,
    pub efficiency: Option<serde_json::Number>,
    pub stages: serde_json::Value,
    /// Minutes per stage across all sleep records of the date
    pub stage_minutes: StageValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateMetrics {
    pub query_date: String,
    pub heart_rate_data: Vec<HeartRatePoint>,
    pub resting_heart_rate: f64,
    pub resting_heart_rate_values: Vec<serde_json::Number>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrvMetrics {
    pub query_date: String,
    pub rmssd: f64,
    pub coverage_percentage: f64,
    pub lf_power: BandPower,
    pub hf_power: BandPower,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreathingRateMetrics {
    pub query_date: String,
    pub overall_avg_breaths_per_minute: f64,
    pub stage_avg_breaths_per_minute: StageValues,
}

/// Vendor payload returned without derivation (user info, SpO2, activity)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassthroughMetrics {
    pub query_date: String,
    pub data: serde_json::Value,
}

/// Successful metric record for one (date, scope) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricResult {
    Sleep(SleepMetrics),
    HeartRate(HeartRateMetrics),
    Hrv(HrvMetrics),
    BreathingRate(BreathingRateMetrics),
    Passthrough(PassthroughMetrics),
}

impl MetricResult {
    pub fn query_date(&self) -> &str {
        match self {
            MetricResult::Sleep(m) => &m.query_date,
            MetricResult::HeartRate(m) => &m.query_date,
            MetricResult::Hrv(m) => &m.query_date,
            MetricResult::BreathingRate(m) => &m.query_date,
            MetricResult::Passthrough(m) => &m.query_date,
        }
    }
}

/// Structured failure returned in place of a metric record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricBody {
    Metric(MetricResult),
    Error(ErrorResult),
}

/// Response body plus HTTP-equivalent status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResponse {
    pub status: u16,
    pub body: MetricBody,
}

impl MetricResponse {
    pub fn ok(result: MetricResult) -> Self {
        Self {
            status: 200,
            body: MetricBody::Metric(result),
        }
    }

    pub fn error(status: u16, message: String) -> Self {
        Self {
            status,
            body: MetricBody::Error(ErrorResult { error: message }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, MetricBody::Metric(_))
    }

    pub fn metric(&self) -> Option<&MetricResult> {
        match &self.body {
            MetricBody::Metric(m) => Some(m),
            MetricBody::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.body {
            MetricBody::Error(e) => Some(&e.error),
            MetricBody::Metric(_) => None,
        }
    }

    /// Serialize the body (without status) to JSON
    pub fn body_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string(&self.body).map_err(ComputeError::JsonError)
    }
}

/// Responses for several scopes of one date
#[derive(Debug, Clone, Serialize)]
pub struct VitalsReport {
    pub report_id: Uuid,
    pub producer: String,
    pub version: String,
    /// Identifies the processor that produced the report
    pub instance_id: Uuid,
    pub source_vendor: String,
    pub computed_at_utc: DateTime<Utc>,
    pub query_date: String,
    pub metrics: BTreeMap<DataScope, MetricResponse>,
}

impl VitalsReport {
    pub fn failed_scopes(&self) -> Vec<DataScope> {
        self.metrics
            .iter()
            .filter(|(_, response)| !response.is_success())
            .map(|(scope, _)| *scope)
            .collect()
    }
}
