//! # Throttl Common
//!
//! Shared domain types, validation, and errors for Throttl.
//!
//! ## Core Types
//!
//! - [`ApiConfig`]: a tracked API and its rate-limit window
//! - [`UsageEvent`]: units consumed against an API
//! - [`PredictedStatus`]: utilization and time-to-limit for an API
//! - [`Stored`]: a persisted record with its id and write timestamps
//!
//! Client input arrives as [`ApiConfigInput`] / [`UsageEventInput`] and is
//! normalized by [`validate_api_config`] / [`validate_usage_event`] before it
//! reaches storage.

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{FieldError, Result, ThrottlError, ValidationError};
pub use types::{
    api_config::{validate_api_config, ApiConfig, ApiConfigInput, DEFAULT_THRESHOLDS},
    record::{Document, Stored},
    status::PredictedStatus,
    usage_event::{
        validate_usage_event, validate_usage_event_at, UsageEvent, UsageEventInput, DEFAULT_UNITS,
    },
};

/// Throttl version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
