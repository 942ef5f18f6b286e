//! Error types for Synheart Vitals

use thiserror::Error;

/// Errors that can occur during metric computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Empty series: {0}")]
    EmptySeries(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Unsupported data scope: {0}")]
    UnsupportedScope(String),

    #[error("Data retrieval failed: {0}")]
    RetrievalError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl ComputeError {
    /// HTTP-equivalent status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            ComputeError::JsonError(_)
            | ComputeError::MalformedPayload(_)
            | ComputeError::MissingField(_)
            | ComputeError::UnsupportedScope(_)
            | ComputeError::ConfigError(_) => 400,
            ComputeError::EmptySeries(_) | ComputeError::InsufficientData(_) => 422,
            ComputeError::RetrievalError(_) => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ComputeError::EmptySeries("hr".into()).status_code(), 422);
        assert_eq!(ComputeError::InsufficientData("rr".into()).status_code(), 422);
        assert_eq!(ComputeError::MalformedPayload("x".into()).status_code(), 400);
        assert_eq!(ComputeError::RetrievalError("timeout".into()).status_code(), 502);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(ComputeError::from(json_err).status_code(), 400);
    }

    #[test]
    fn test_messages() {
        let err = ComputeError::InsufficientData("RMSSD needs at least 2 intervals".into());
        assert_eq!(
            err.to_string(),
            "Insufficient data: RMSSD needs at least 2 intervals"
        );
    }
}
