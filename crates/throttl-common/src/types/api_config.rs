//! API configuration - the rate-limit window being tracked
//!
//! An API is registered once with its window length and request budget and
//! is immutable afterwards.

use serde::{Deserialize, Serialize};

use super::record::Document;
use crate::error::ValidationError;

/// Alert thresholds applied when the caller supplies none (percent)
pub const DEFAULT_THRESHOLDS: [u32; 3] = [80, 90, 95];

/// Registration payload as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfigInput {
    /// Human-readable name, e.g. "OpenAI"
    pub name: String,
    /// Provider or vendor label
    #[serde(default)]
    pub provider: Option<String>,
    /// Rate-limit window length
    pub window_seconds: i64,
    /// Requests allowed per window
    pub max_requests: i64,
    /// Tracked endpoint identifiers
    #[serde(default)]
    pub endpoints: Option<Vec<String>>,
    /// Alert thresholds in percent
    #[serde(default)]
    pub thresholds: Option<Vec<u32>>,
}

/// A validated API configuration
///
/// `window_seconds` and `max_requests` are always positive. Thresholds are
/// kept exactly as configured: neither deduplicated nor sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub name: String,
    #[serde(default)]
    pub provider: Option<String>,
    pub window_seconds: u64,
    pub max_requests: u64,
    #[serde(default)]
    pub endpoints: Option<Vec<String>>,
    pub thresholds: Vec<u32>,
}

impl Document for ApiConfig {
    const COLLECTION: &'static str = "api";
}

impl ApiConfig {
    /// Build a configuration with the default thresholds
    ///
    /// Callers are responsible for passing positive window and limit values;
    /// client input goes through [`validate_api_config`].
    pub fn new(name: impl Into<String>, window_seconds: u64, max_requests: u64) -> Self {
        Self {
            name: name.into(),
            provider: None,
            window_seconds,
            max_requests,
            endpoints: None,
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_thresholds(mut self, thresholds: Vec<u32>) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = Some(endpoints);
        self
    }
}

/// Validate a registration payload into an [`ApiConfig`]
pub fn validate_api_config(input: ApiConfigInput) -> Result<ApiConfig, ValidationError> {
    let mut errors = ValidationError::new();

    if input.name.trim().is_empty() {
        errors.push("name", "must not be empty");
    }
    if input.window_seconds <= 0 {
        errors.push("window_seconds", "must be greater than 0");
    }
    if input.max_requests <= 0 {
        errors.push("max_requests", "must be greater than 0");
    }

    errors.into_result(())?;

    Ok(ApiConfig {
        name: input.name,
        provider: input.provider,
        window_seconds: input.window_seconds as u64,
        max_requests: input.max_requests as u64,
        endpoints: input.endpoints,
        thresholds: input
            .thresholds
            .unwrap_or_else(|| DEFAULT_THRESHOLDS.to_vec()),
    })
}
