//! Centralized error handling for the trust scoring engine
//!
//! This module provides a unified error type for the public recompute
//! operations. Only entity-not-found and input-validation failures reach the
//! caller; signal-provider failures are absorbed inside the engines by
//! substituting the documented neutral defaults.

use serde::Serialize;
use thiserror::Error;

/// Engine error type surfaced by the public operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// External signal lookup failed. Engines recover from this internally
    /// with a neutral default; it is never returned by a public operation.
    #[error("Signal provider error: {0}")]
    SignalProvider(String),
}

/// Serializable error body for the surrounding system
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl EngineError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "NOT_FOUND",
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::SignalProvider(_) => "SIGNAL_PROVIDER_ERROR",
        }
    }

    /// Build the serializable response body, logging server-side issues
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            EngineError::SignalProvider(_) => {
                tracing::error!(error = %self, code = %self.error_code(), "Engine error escaped recovery");
            }
            _ => {
                tracing::debug!(error = %self, code = %self.error_code(), "Client error occurred");
            }
        }

        ErrorResponse {
            error: ErrorDetails {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        }
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(err: validator::ValidationErrors) -> Self {
        EngineError::Validation(err.to_string())
    }
}

/// Result type alias using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EngineError::NotFound("user 7".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            EngineError::Validation("rating".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            EngineError::SignalProvider("timeout".to_string()).error_code(),
            "SIGNAL_PROVIDER_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::NotFound("product 42".to_string());
        assert!(err.to_string().contains("product 42"));

        let err = EngineError::Validation("rating out of range".to_string());
        assert!(err.to_string().contains("rating out of range"));
    }

    #[test]
    fn test_response_body_shape() {
        let body = EngineError::NotFound("seller 3".to_string()).to_response();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("seller 3"));
    }

    #[test]
    fn test_validation_errors_conversion() {
        use validator::Validate;

        #[derive(Validate)]
        struct Probe {
            #[validate(range(min = 1, max = 5))]
            rating: i32,
        }

        let probe = Probe { rating: 9 };
        let err: EngineError = probe.validate().unwrap_err().into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
