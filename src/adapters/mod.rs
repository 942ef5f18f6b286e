//! Vendor payload adapters
//!
//! This module provides adapters that parse raw vendor JSON payloads and map them
//! to the canonical samples and sleep records the metric components consume.

mod fitbit;

pub use fitbit::FitbitAdapter;

use crate::error::ComputeError;
use crate::types::{HeartRateSample, SleepRecord, Vendor};

/// Trait for vendor payload adapters
pub trait VendorPayloadAdapter {
    fn vendor(&self) -> Vendor;

    /// Sleep logs for a date, main sleep first
    fn parse_sleep(&self, raw_json: &str) -> Result<Vec<SleepRecord>, ComputeError>;

    /// Intraday heart-rate series in time order
    fn parse_heart_rate(&self, raw_json: &str) -> Result<Vec<HeartRateSample>, ComputeError>;

    /// RR intervals in milliseconds
    fn parse_rr_intervals(&self, raw_json: &str) -> Result<Vec<f64>, ComputeError>;

    /// Payloads with no derived metrics are forwarded as parsed JSON
    fn parse_passthrough(&self, raw_json: &str) -> Result<serde_json::Value, ComputeError> {
        Ok(serde_json::from_str(raw_json)?)
    }
}
