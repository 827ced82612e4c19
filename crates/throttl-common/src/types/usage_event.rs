//! Usage events - units consumed against an API's budget
//!
//! Events are append-only. The referenced `api_id` is not checked against
//! registered APIs when an event is recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::Document;
use super::timestamp;
use crate::error::ValidationError;

/// Units consumed when the caller does not say
pub const DEFAULT_UNITS: i64 = 1;

/// Usage report as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageEventInput {
    /// Identifier of the API the usage counts against
    pub api_id: String,
    /// Endpoint label
    #[serde(default)]
    pub endpoint: Option<String>,
    /// When the usage happened; record time when omitted
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Requests consumed (batched reports send more than one)
    #[serde(default)]
    pub units: Option<i64>,
}

/// A validated usage event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub api_id: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub units: u64,
}

impl Document for UsageEvent {
    const COLLECTION: &'static str = "usageevent";
}

impl UsageEvent {
    /// Single-unit event at `timestamp`
    pub fn new(api_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            api_id: api_id.into(),
            endpoint: None,
            timestamp,
            units: DEFAULT_UNITS as u64,
        }
    }

    pub fn with_units(mut self, units: u64) -> Self {
        self.units = units;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Validate a usage report, stamping it with the current time if needed
pub fn validate_usage_event(input: UsageEventInput) -> Result<UsageEvent, ValidationError> {
    validate_usage_event_at(input, Utc::now())
}

/// Validate a usage report against an explicit clock
pub fn validate_usage_event_at(
    input: UsageEventInput,
    now: DateTime<Utc>,
) -> Result<UsageEvent, ValidationError> {
    let units = input.units.unwrap_or(DEFAULT_UNITS);
    if units <= 0 {
        return Err(ValidationError::field("units", "must be greater than 0"));
    }

    Ok(UsageEvent {
        api_id: input.api_id,
        endpoint: input.endpoint,
        timestamp: input.timestamp.unwrap_or(now),
        units: units as u64,
    })
}
