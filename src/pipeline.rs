//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Vitals. It parses vendor
//! payloads, runs the metric components and turns every outcome into a
//! `MetricResponse`. Failures never escape this layer: they become an
//! `ErrorResult` with an HTTP-equivalent status.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapters::{FitbitAdapter, VendorPayloadAdapter};
use crate::breathing::classify;
use crate::config::MetricsConfig;
use crate::error::ComputeError;
use crate::heart_rate::estimate;
use crate::hrv::analyze_with_config;
use crate::retriever::{DeviceDataRetriever, FetchRequest};
use crate::sleep::StageTotals;
use crate::stats::round2;
use crate::types::{
    BreathingRateMetrics, DataScope, HeartRateMetrics, HrvMetrics, MetricResponse, MetricResult,
    PassthroughMetrics, SleepMetrics, StageValues, VitalsReport,
};
use crate::{PRODUCER_NAME, VITALS_VERSION};

/// Compute one metric from a Fitbit payload with the default configuration.
///
/// # Arguments
/// * `scope` - Metric category of the payload
/// * `date` - Query date (`YYYY-MM-DD`), echoed back as `query_date`
/// * `raw_json` - Raw vendor API response JSON
///
/// # Example
/// ```ignore
/// let response = compute_metric(DataScope::Hrv, "2024-01-15", hrv_json);
/// assert!(response.is_success());
/// ```
pub fn compute_metric(scope: DataScope, date: &str, raw_json: &str) -> MetricResponse {
    MetricResponseBuilder::new().build(scope, date, raw_json)
}

/// Turns raw vendor payloads into metric responses
pub struct MetricResponseBuilder {
    adapter: Box<dyn VendorPayloadAdapter>,
    config: MetricsConfig,
}

impl Default for MetricResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricResponseBuilder {
    /// Builder for Fitbit payloads with default settings
    pub fn new() -> Self {
        Self::with_config(MetricsConfig::default())
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        Self::with_adapter(Box::new(FitbitAdapter), config)
    }

    pub fn with_adapter(adapter: Box<dyn VendorPayloadAdapter>, config: MetricsConfig) -> Self {
        Self { adapter, config }
    }

    /// Dispatch on `scope`
    pub fn build(&self, scope: DataScope, date: &str, raw_json: &str) -> MetricResponse {
        debug!(vendor = self.adapter.vendor().as_str(), %scope, "building metric");
        match scope {
            DataScope::UserInfo => self.user_info(date, raw_json),
            DataScope::Sleep => self.sleep(date, raw_json),
            DataScope::HeartRate => self.heart_rate(date, raw_json),
            DataScope::Hrv => self.hrv(date, raw_json),
            DataScope::BreathingRate => self.breathing_rate(date, raw_json),
            DataScope::Spo2 => self.spo2(date, raw_json),
            DataScope::Activity => self.activity(date, raw_json),
        }
    }

    /// Device list, passed through
    pub fn user_info(&self, date: &str, raw_json: &str) -> MetricResponse {
        respond(DataScope::UserInfo, date, self.passthrough(date, raw_json))
    }

    /// Primary sleep summary plus per-stage minutes across all records
    pub fn sleep(&self, date: &str, raw_json: &str) -> MetricResponse {
        respond(DataScope::Sleep, date, self.compute_sleep(date, raw_json))
    }

    /// Intraday samples and resting heart rate
    pub fn heart_rate(&self, date: &str, raw_json: &str) -> MetricResponse {
        respond(DataScope::HeartRate, date, self.compute_heart_rate(date, raw_json))
    }

    /// RMSSD, coverage and LF/HF power
    pub fn hrv(&self, date: &str, raw_json: &str) -> MetricResponse {
        respond(DataScope::Hrv, date, self.compute_hrv(date, raw_json))
    }

    /// Breaths per minute overall and by sleep stage
    pub fn breathing_rate(&self, date: &str, raw_json: &str) -> MetricResponse {
        respond(
            DataScope::BreathingRate,
            date,
            self.compute_breathing_rate(date, raw_json),
        )
    }

    pub fn spo2(&self, date: &str, raw_json: &str) -> MetricResponse {
        respond(DataScope::Spo2, date, self.passthrough(date, raw_json))
    }

    pub fn activity(&self, date: &str, raw_json: &str) -> MetricResponse {
        respond(DataScope::Activity, date, self.passthrough(date, raw_json))
    }

    fn compute_sleep(&self, date: &str, raw_json: &str) -> Result<MetricResult, ComputeError> {
        let query_date = require_date(date)?;
        let records = self.adapter.parse_sleep(raw_json)?;
        let primary = records.first().ok_or_else(|| {
            ComputeError::EmptySeries(format!("no sleep records for {query_date}"))
        })?;

        let totals = StageTotals::from_intervals(
            records
                .iter()
                .filter_map(|record| record.intervals.as_ref())
                .flatten(),
        );
        let minutes = totals.stage_minutes;

        Ok(MetricResult::Sleep(SleepMetrics {
            query_date,
            duration_minutes: round2(primary.duration_ms.unwrap_or(0.0) / 60_000.0),
            efficiency: primary.efficiency.clone(),
            stages: primary
                .stage_summary
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
            stage_minutes: StageValues {
                deep: round2(minutes.deep),
                light: round2(minutes.light),
                rem: round2(minutes.rem),
                wake: round2(minutes.wake),
            },
        }))
    }

    fn compute_heart_rate(&self, date: &str, raw_json: &str) -> Result<MetricResult, ComputeError> {
        let query_date = require_date(date)?;
        let series = self.adapter.parse_heart_rate(raw_json)?;
        let resting = estimate(&series)?;

        Ok(MetricResult::HeartRate(HeartRateMetrics {
            query_date,
            heart_rate_data: resting.samples,
            resting_heart_rate: resting.rhr,
            resting_heart_rate_values: resting.contributing_values,
        }))
    }

    fn compute_hrv(&self, date: &str, raw_json: &str) -> Result<MetricResult, ComputeError> {
        let query_date = require_date(date)?;
        let rr_intervals = self.adapter.parse_rr_intervals(raw_json)?;
        let analysis = analyze_with_config(&rr_intervals, &self.config.hrv)?;

        Ok(MetricResult::Hrv(HrvMetrics {
            query_date,
            rmssd: analysis.rmssd,
            coverage_percentage: analysis.coverage_percentage,
            lf_power: analysis.lf_power,
            hf_power: analysis.hf_power,
        }))
    }

    fn compute_breathing_rate(
        &self,
        date: &str,
        raw_json: &str,
    ) -> Result<MetricResult, ComputeError> {
        let query_date = require_date(date)?;
        let records = self.adapter.parse_sleep(raw_json)?;
        let rates = classify(&records);

        Ok(MetricResult::BreathingRate(BreathingRateMetrics {
            query_date,
            overall_avg_breaths_per_minute: rates.overall_avg_breaths_per_minute,
            stage_avg_breaths_per_minute: rates.stage_avg_breaths_per_minute,
        }))
    }

    fn passthrough(&self, date: &str, raw_json: &str) -> Result<MetricResult, ComputeError> {
        let query_date = require_date(date)?;
        let data = self.adapter.parse_passthrough(raw_json)?;
        Ok(MetricResult::Passthrough(PassthroughMetrics { query_date, data }))
    }
}

/// The date is echoed exactly as given; blank dates are rejected
fn require_date(date: &str) -> Result<String, ComputeError> {
    if date.trim().is_empty() {
        return Err(ComputeError::MissingField("query_date".to_string()));
    }
    Ok(date.to_string())
}

/// The single translation point from typed failures to `ErrorResult`
fn respond(
    scope: DataScope,
    date: &str,
    result: Result<MetricResult, ComputeError>,
) -> MetricResponse {
    match result {
        Ok(metric) => {
            debug!(%scope, date, "metric computed");
            MetricResponse::ok(metric)
        }
        Err(e) => {
            warn!(%scope, date, error = %e, "metric computation failed");
            MetricResponse::error(
                e.status_code(),
                format!("An error occurred while computing {scope} data: {e}"),
            )
        }
    }
}

/// Fetch-then-compute driver over a device data retriever
pub struct VitalsProcessor<R: DeviceDataRetriever> {
    retriever: R,
    builder: MetricResponseBuilder,
    instance_id: Uuid,
}

impl<R: DeviceDataRetriever> VitalsProcessor<R> {
    pub fn new(retriever: R) -> Self {
        Self::with_builder(retriever, MetricResponseBuilder::new())
    }

    pub fn with_builder(retriever: R, builder: MetricResponseBuilder) -> Self {
        Self {
            retriever,
            builder,
            instance_id: Uuid::new_v4(),
        }
    }

    /// Fetch one scope for `date` and build its response.
    ///
    /// Surrounding whitespace is stripped from `date` before both the fetch
    /// and the computation see it.
    pub fn query(&self, scope: DataScope, date: &str, access_token: Option<&str>) -> MetricResponse {
        let date = date.trim();
        let request = FetchRequest {
            scope,
            date,
            access_token,
        };

        match self.retriever.fetch(&request) {
            Ok(raw_json) => self.builder.build(scope, date, &raw_json),
            Err(e) => {
                warn!(%scope, date, error = %e, "payload retrieval failed");
                MetricResponse::error(
                    e.status_code(),
                    format!("An error occurred during data fetch: {e}"),
                )
            }
        }
    }

    /// Query each scope; a failing scope does not stop the others
    pub fn report(
        &self,
        scopes: &[DataScope],
        date: &str,
        access_token: Option<&str>,
    ) -> VitalsReport {
        let date = date.trim();
        let metrics: BTreeMap<DataScope, MetricResponse> = scopes
            .iter()
            .map(|scope| (*scope, self.query(*scope, date, access_token)))
            .collect();

        debug!(
            instance_id = %self.instance_id,
            date,
            scopes = metrics.len(),
            "vitals report assembled"
        );

        VitalsReport {
            report_id: Uuid::new_v4(),
            producer: PRODUCER_NAME.to_string(),
            version: VITALS_VERSION.to_string(),
            instance_id: self.instance_id,
            source_vendor: self.retriever.vendor().as_str().to_string(),
            computed_at_utc: Utc::now(),
            query_date: date.to_string(),
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::FixtureRetriever;
    use crate::types::{BandPower, MetricBody, Vendor};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const DATE: &str = "2024-01-15";

    fn sample_sleep_json() -> &'static str {
        r#"{
            "sleep": [{
                "duration": 25200000,
                "efficiency": 92,
                "levels": {
                    "summary": {"deep": {"minutes": 10}, "wake": {"minutes": 0}},
                    "data": [
                        {"level": "deep", "seconds": 600, "breaths": 80},
                        {"level": "wake", "seconds": 0, "breaths": 0}
                    ]
                }
            }, {
                "duration": 1800000,
                "efficiency": 85,
                "levels": {
                    "data": [
                        {"level": "light", "seconds": 1800, "breaths": 450},
                        {"level": "asleep", "seconds": 120, "breaths": 30}
                    ]
                }
            }]
        }"#
    }

    fn sample_heart_json() -> &'static str {
        r#"{
            "activities-heart-intraday": {
                "dataset": [
                    {"time": "00:00:00", "value": 62},
                    {"time": "00:01:00", "value": 50},
                    {"time": "00:02:00", "value": 72},
                    {"time": "00:03:00", "value": 55},
                    {"time": "00:04:00", "value": 58},
                    {"time": "00:05:00", "value": 60},
                    {"time": "00:06:00", "value": 52},
                    {"time": "00:07:00", "value": 65},
                    {"time": "00:08:00", "value": 68},
                    {"time": "00:09:00", "value": 70}
                ]
            }
        }"#
    }

    fn body_value(response: &MetricResponse) -> serde_json::Value {
        serde_json::from_str(&response.body_json().unwrap()).unwrap()
    }

    #[test]
    fn test_sleep_metrics() {
        let response = compute_metric(DataScope::Sleep, DATE, sample_sleep_json());
        assert_eq!(response.status, 200);

        assert_eq!(response.metric().unwrap().query_date(), DATE);
        let body = body_value(&response);
        assert_eq!(body["duration_minutes"], 420.0);
        assert_eq!(body["efficiency"], json!(92));
        assert_eq!(body["stages"]["deep"]["minutes"], 10);
        assert_eq!(
            body["stage_minutes"],
            json!({"deep": 10.0, "light": 30.0, "rem": 0.0, "wake": 0.0})
        );
    }

    #[test]
    fn test_sleep_without_records() {
        let response = compute_metric(DataScope::Sleep, DATE, r#"{"sleep": []}"#);
        assert_eq!(response.status, 422);
        assert!(response.error_message().unwrap().contains("no sleep records"));
    }

    #[test]
    fn test_heart_rate_metrics() {
        let response = compute_metric(DataScope::HeartRate, DATE, sample_heart_json());
        let Some(MetricResult::HeartRate(metrics)) = response.metric() else {
            panic!("expected heart rate metrics, got {response:?}");
        };

        assert_eq!(metrics.query_date, DATE);
        assert_eq!(metrics.resting_heart_rate, 50.0);
        assert_eq!(
            metrics.resting_heart_rate_values,
            vec![serde_json::Number::from(50)]
        );
        assert_eq!(metrics.heart_rate_data.len(), 10);

        // Integer bpm from the vendor stays integer on the way out
        let body = body_value(&response);
        assert_eq!(body["heart_rate_data"][0], json!({"time": "00:00:00", "heart_rate": 62}));
        assert_eq!(body["resting_heart_rate_values"], json!([50]));
    }

    #[test]
    fn test_heart_rate_empty_series_is_error_result() {
        let response = compute_metric(
            DataScope::HeartRate,
            DATE,
            r#"{"activities-heart-intraday": {"dataset": []}}"#,
        );
        assert_eq!(response.status, 422);
        let body = body_value(&response);
        assert!(body["error"].as_str().unwrap().contains("Empty series"));
        assert!(body.get("query_date").is_none());
    }

    #[test]
    fn test_hrv_metrics() {
        let response = compute_metric(
            DataScope::Hrv,
            DATE,
            r#"{"rr_intervals": [800, 810, 790, 805]}"#,
        );
        let Some(MetricResult::Hrv(metrics)) = response.metric() else {
            panic!("expected hrv metrics, got {response:?}");
        };

        assert_eq!(metrics.rmssd, 15.55);
        assert_eq!(metrics.coverage_percentage, 0.28);
        assert_eq!(metrics.lf_power, BandPower::Measured(0.0));
    }

    #[test]
    fn test_hrv_empty_is_insufficient_data() {
        let response = compute_metric(DataScope::Hrv, DATE, r#"{"rr_intervals": []}"#);
        assert_eq!(response.status, 422);
        assert!(response
            .error_message()
            .unwrap()
            .contains("Insufficient data"));
    }

    #[test]
    fn test_hrv_respects_configured_expected_intervals() {
        let mut config = MetricsConfig::default();
        config.hrv.expected_daily_intervals = 8.0;
        let builder = MetricResponseBuilder::with_config(config);

        let response = builder.hrv(DATE, r#"{"rr_intervals": [800, 810, 790, 805]}"#);
        assert_eq!(body_value(&response)["coverage_percentage"], 50.0);
    }

    #[test]
    fn test_breathing_rate_metrics() {
        let response = compute_metric(DataScope::BreathingRate, DATE, sample_sleep_json());
        let body = body_value(&response);

        assert_eq!(body["query_date"], DATE);
        assert_eq!(body["stage_avg_breaths_per_minute"]["deep"], 8.0);
        assert_eq!(body["stage_avg_breaths_per_minute"]["light"], 15.0);
        assert_eq!(body["stage_avg_breaths_per_minute"]["wake"], 0.0);
        // 560 breaths over 42 minutes, "asleep" included
        assert_eq!(body["overall_avg_breaths_per_minute"], 13.33);
    }

    #[test]
    fn test_breathing_rate_missing_sleep_array() {
        let response = compute_metric(DataScope::BreathingRate, DATE, r#"{"br": []}"#);
        assert_eq!(response.status, 400);
        assert!(matches!(response.body, MetricBody::Error(_)));
    }

    #[test]
    fn test_passthrough_scopes() {
        for scope in [DataScope::UserInfo, DataScope::Spo2, DataScope::Activity] {
            let response = compute_metric(scope, DATE, r#"[{"deviceVersion": "Charge 6"}]"#);
            assert_eq!(response.metric().unwrap().query_date(), DATE, "{scope}");
            let body = body_value(&response);
            assert_eq!(body["data"][0]["deviceVersion"], "Charge 6");
        }
    }

    #[test]
    fn test_invalid_json_never_escapes() {
        for scope in DataScope::ALL {
            let response = compute_metric(scope, DATE, "not valid json");
            assert_eq!(response.status, 400, "{scope}");
            assert!(response
                .error_message()
                .unwrap()
                .starts_with("An error occurred while computing"));
        }
    }

    #[test]
    fn test_missing_date() {
        let response = compute_metric(DataScope::Spo2, "  ", "{}");
        assert_eq!(response.status, 400);
        assert!(response.error_message().unwrap().contains("query_date"));
    }

    #[test]
    fn test_date_is_echoed_as_given() {
        let response = compute_metric(DataScope::Spo2, " 2024-01-15", "{}");
        assert_eq!(response.metric().unwrap().query_date(), " 2024-01-15");
    }

    #[test]
    fn test_processor_trims_date_before_fetch() {
        let retriever = FixtureRetriever::new(Vendor::Fitbit).with_payload(
            DataScope::Hrv,
            DATE,
            r#"{"rr_intervals": [800, 810, 790, 805]}"#,
        );
        let processor = VitalsProcessor::new(retriever);

        let response = processor.query(DataScope::Hrv, " 2024-01-15 ", None);
        assert_eq!(response.status, 200);
        assert_eq!(response.metric().unwrap().query_date(), DATE);

        let report = processor.report(&[DataScope::Hrv], "2024-01-15\n", None);
        assert_eq!(report.query_date, DATE);
        assert!(report.failed_scopes().is_empty());
    }

    #[test]
    fn test_processor_report() {
        let retriever = FixtureRetriever::new(Vendor::Fitbit)
            .with_payload(DataScope::HeartRate, DATE, sample_heart_json())
            .with_payload(DataScope::Hrv, DATE, r#"{"rr_intervals": [800, 810, 790, 805]}"#);
        let processor = VitalsProcessor::new(retriever);

        let report = processor.report(
            &[DataScope::HeartRate, DataScope::Hrv, DataScope::Spo2],
            DATE,
            Some("token"),
        );

        assert_eq!(report.query_date, DATE);
        assert_eq!(report.source_vendor, "fitbit");
        assert_eq!(report.metrics.len(), 3);
        assert_eq!(report.failed_scopes(), vec![DataScope::Spo2]);
        assert_eq!(report.metrics[&DataScope::Spo2].status, 502);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["metrics"]["hrv"]["body"]["rmssd"], 15.55);
        assert_eq!(value["metrics"]["heart_rate"]["status"], 200);
        assert_eq!(
            Uuid::parse_str(value["report_id"].as_str().unwrap()).unwrap(),
            report.report_id
        );
        assert!(value["computed_at_utc"]
            .as_str()
            .unwrap()
            .parse::<chrono::DateTime<Utc>>()
            .is_ok());

        let second = processor.report(&[DataScope::Hrv], DATE, None);
        assert_eq!(second.instance_id, report.instance_id);
        assert_ne!(second.report_id, report.report_id);
        assert_eq!(value["instance_id"], report.instance_id.to_string());
    }
}
