//! Collector error types

use std::collections::BTreeMap;
use thiserror::Error;

use shared::SharedError;

/// Result type for collector operations
pub type CollectorResult<T> = Result<T, CollectorError>;

/// Collector error types
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Local validation failure; never reaches the network
    #[error("{0}")]
    Validation(#[from] SharedError),

    /// Backend answered 401; the stored session is no longer valid
    #[error("Session expired, please sign in again")]
    Unauthorized,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("This action requires an owner account")]
    OwnerOnly,

    /// Backend rejected the request
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Request cancelled")]
    Cancelled,

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("Session storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CollectorError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        CollectorError::Rejected {
            status,
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        CollectorError::Storage {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        CollectorError::Config {
            message: message.into(),
        }
    }

    /// Map a transport error, keeping timeouts distinct
    pub fn from_reqwest(error: reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            CollectorError::Timeout { seconds: timeout_secs }
        } else {
            CollectorError::Network {
                message: error.to_string(),
            }
        }
    }

    /// True for 401s, which end the session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CollectorError::Unauthorized)
    }

    /// Failures where the user's input should be kept for a retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CollectorError::Network { .. } | CollectorError::Timeout { .. } | CollectorError::Cancelled
        ) || matches!(self, CollectorError::Rejected { status, .. } if *status >= 500)
    }

    /// Field-keyed messages from a rejection, if any
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            CollectorError::Rejected { field_errors, .. } if !field_errors.is_empty() => Some(field_errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(CollectorError::Timeout { seconds: 30 }.is_retryable());
        assert!(CollectorError::Cancelled.is_retryable());
        assert!(CollectorError::rejected(502, "Bad Gateway").is_retryable());
        assert!(!CollectorError::rejected(400, "bad date").is_retryable());
        assert!(!CollectorError::Unauthorized.is_retryable());
        assert!(!CollectorError::from(SharedError::nothing_to_submit()).is_retryable());
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = CollectorError::from(SharedError::nothing_to_submit());
        assert!(err.to_string().contains("nothing to submit"));
        assert!(err.field_errors().is_none());
    }
}
