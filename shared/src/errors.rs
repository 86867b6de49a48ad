//! Error types shared between crates

use thiserror::Error;

/// A request field failed validation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
