//! Device data retrieval
//!
//! The engine never talks to a vendor API itself. A `DeviceDataRetriever`
//! hands it raw JSON per (scope, date); authorization state travels in the
//! request instead of living in a session. The implementations here serve
//! fixture payloads from memory or from a directory tree.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ComputeError;
use crate::types::{DataScope, Vendor};

/// One fetch of one scope for one date
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub scope: DataScope,
    pub date: &'a str,
    /// Bearer token for live retrievers; fixture retrievers ignore it
    pub access_token: Option<&'a str>,
}

/// Source of raw vendor payloads
pub trait DeviceDataRetriever {
    fn vendor(&self) -> Vendor;

    /// Raw JSON for the requested scope and date
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<String, ComputeError>;
}

/// In-memory payloads keyed by scope and date
#[derive(Debug, Clone)]
pub struct FixtureRetriever {
    vendor: Vendor,
    payloads: HashMap<(DataScope, String), String>,
}

impl FixtureRetriever {
    pub fn new(vendor: Vendor) -> Self {
        Self {
            vendor,
            payloads: HashMap::new(),
        }
    }

    pub fn insert(&mut self, scope: DataScope, date: &str, raw_json: impl Into<String>) {
        self.payloads
            .insert((scope, date.to_string()), raw_json.into());
    }

    pub fn with_payload(mut self, scope: DataScope, date: &str, raw_json: impl Into<String>) -> Self {
        self.insert(scope, date, raw_json);
        self
    }
}

impl DeviceDataRetriever for FixtureRetriever {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<String, ComputeError> {
        self.payloads
            .get(&(request.scope, request.date.to_string()))
            .cloned()
            .ok_or_else(|| {
                ComputeError::RetrievalError(format!(
                    "no {} payload for {}",
                    request.scope, request.date
                ))
            })
    }
}

/// Payloads stored on disk as `<root>/<date>/<scope>.json`
#[derive(Debug, Clone)]
pub struct DirectoryRetriever {
    vendor: Vendor,
    root: PathBuf,
}

impl DirectoryRetriever {
    pub fn new(vendor: Vendor, root: impl Into<PathBuf>) -> Self {
        Self {
            vendor,
            root: root.into(),
        }
    }

    /// Path a payload for this scope and date is read from
    pub fn payload_path(&self, scope: DataScope, date: &str) -> Result<PathBuf, ComputeError> {
        if date.is_empty() || date.contains(['/', '\\']) || date.contains("..") {
            return Err(ComputeError::MalformedPayload(format!(
                "query date {date:?} is not usable as a directory name"
            )));
        }
        Ok(self.root.join(date).join(format!("{}.json", scope.as_str())))
    }
}

impl DeviceDataRetriever for DirectoryRetriever {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<String, ComputeError> {
        let path = self.payload_path(request.scope, request.date)?;
        std::fs::read_to_string(&path)
            .map_err(|e| ComputeError::RetrievalError(format!("{}: {e}", path.display())))
    }
}
