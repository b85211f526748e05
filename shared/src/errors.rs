//! Shared error types for the egg collection domain

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Validation failed: {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Box {address} is not part of the farm layout")]
    UnknownBox { address: String },

    #[error("Invalid box address: {input}")]
    InvalidBoxAddress { input: String },

    #[error("Invalid role: {input}")]
    InvalidRole { input: String },

    #[error("Invalid record kind: {input}")]
    InvalidRecordKind { input: String },
}

impl SharedError {
    /// Build a field-keyed validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SharedError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Submission attempted with no shade eggs and no box counts
    pub fn nothing_to_submit() -> Self {
        Self::validation("submission", "nothing to submit")
    }

    /// Field name for validation errors, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            SharedError::ValidationError { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
