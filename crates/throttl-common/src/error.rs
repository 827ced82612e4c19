//! Error types for Throttl
//!
//! Provides a unified error type and the field-level validation error

use serde::Serialize;
use thiserror::Error;

/// Result type alias using ThrottlError
pub type Result<T> = std::result::Result<T, ThrottlError>;

/// Unified error type for Throttl operations
#[derive(Debug, Error)]
pub enum ThrottlError {
    // Malformed input, rejected before it reaches storage
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // Lookup of an unknown record
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    // Store unreachable or timed out
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ThrottlError {
    /// Not-found error for an API configuration id
    pub fn api_not_found(id: impl Into<String>) -> Self {
        ThrottlError::NotFound {
            kind: "API",
            id: id.into(),
        }
    }

    /// Whether the error is an expected client-facing outcome rather than an incident
    pub fn is_client_error(&self) -> bool {
        matches!(self, ThrottlError::Validation(_) | ThrottlError::NotFound { .. })
    }
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Input validation failure carrying every offending field
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", summary(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validation error for a single field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.push(field, message);
        err
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(value)` when no field was rejected
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, ValidationError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<serde_json::Error> for ThrottlError {
    fn from(err: serde_json::Error) -> Self {
        ThrottlError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for ThrottlError {
    fn from(err: anyhow::Error) -> Self {
        ThrottlError::Internal(err.to_string())
    }
}
