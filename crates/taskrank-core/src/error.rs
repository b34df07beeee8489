//! Core error types for taskrank-core.
//!
//! Errors are split by where they surface:
//! - [`ValidationError`] is returned synchronously to the caller and never
//!   reaches the event bus.
//! - [`TransportError`] comes back from a scoring call and is published as
//!   `ui:error` by the action controller.
//! - [`DeliveryError`] reports a bus handler that aborted a publish.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for taskrank-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Scoring service errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Event delivery errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input problems that block an intake or action before anything changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Bulk import triggered with an empty textarea
    #[error("Please paste some JSON first!")]
    EmptyBulkInput,

    /// Bulk text is not valid JSON
    #[error("Invalid JSON: {0}")]
    MalformedJson(String),

    /// Bulk text parsed, but is not a JSON array
    #[error("Invalid JSON: JSON must be an array [...]")]
    NotAnArray,

    /// Neither staged tasks nor bulk tasks to submit
    #[error("Add tasks first!")]
    NothingToSubmit,
}

impl ValidationError {
    pub(crate) fn malformed(err: &serde_json::Error) -> Self {
        ValidationError::MalformedJson(err.to_string())
    }
}

/// Failures of a scoring call. `Display` is the human-readable message
/// shown in the error region.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Connection, DNS or body-read failure
    #[error("{0}")]
    Network(String),

    /// No response within the configured timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Non-2xx response; `message` comes from the body when available
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// 2xx response whose body is not a list of scored tasks
    #[error("Unexpected response from scoring service: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// HTTP status for rejected calls.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Config directory could not be created
    #[error("Cannot prepare config directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error returned by a bus handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A handler failed and later handlers for the same publish were skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("handler #{position} for '{topic}' failed ({skipped} skipped): {source}")]
pub struct DeliveryError {
    pub topic: &'static str,
    /// Zero-based position of the failing handler in registration order
    pub position: usize,
    /// Handlers that never ran for this publish
    pub skipped: usize,
    #[source]
    pub source: HandlerError,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_service_message_verbatim() {
        let err = TransportError::Rejected {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn validation_messages_match_user_alerts() {
        assert_eq!(
            ValidationError::NothingToSubmit.to_string(),
            "Add tasks first!"
        );
        assert_eq!(
            ValidationError::NotAnArray.to_string(),
            "Invalid JSON: JSON must be an array [...]"
        );
    }

    #[test]
    fn core_error_wraps_validation() {
        let err: CoreError = ValidationError::EmptyBulkInput.into();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
