//! Synheart Vitals - Metric-derivation engine for wearable vitals
//!
//! Vitals turns raw wearable vendor payloads into summary health metrics:
//! vendor adaptation → metric components → response building.
//!
//! ## Components
//!
//! - **Sleep Stage Aggregator**: per-stage breath and minute totals
//! - **Resting Heart Rate Estimator**: lowest-decile mean of an intraday series
//! - **HRV Analyzer**: RMSSD, coverage and Welch LF/HF band power
//! - **Breathing Rate Classifier**: breaths per minute by sleep stage
//! - **Metric Response Builder**: date-stamped results or structured errors

pub mod adapters;
pub mod breathing;
pub mod config;
pub mod error;
pub mod heart_rate;
pub mod hrv;
pub mod pipeline;
pub mod retriever;
pub mod sleep;
pub mod spectral;
pub mod stats;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::MetricsConfig;
pub use error::ComputeError;
pub use pipeline::{compute_metric, MetricResponseBuilder, VitalsProcessor};
pub use retriever::{DeviceDataRetriever, DirectoryRetriever, FetchRequest, FixtureRetriever};
pub use types::{DataScope, ErrorResult, MetricBody, MetricResponse, MetricResult, VitalsReport};

/// Vitals version embedded in reports
pub const VITALS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "synheart-vitals";
