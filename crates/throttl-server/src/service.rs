//! Throttl service
//!
//! Orchestrates the store, the aggregator, and the projector for the HTTP
//! surface. Holds no mutable state of its own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use throttl_common::{
    validate_api_config, validate_usage_event, ApiConfig, ApiConfigInput, PredictedStatus,
    Result, Stored, ThrottlError, UsageEvent, UsageEventInput,
};
use throttl_metering::{StatusProjector, UsageAggregator};
use throttl_store::{ApiFilter, DocumentStore};

/// Store reachability report; never an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Usage tracking service
pub struct ThrottlService {
    store: Arc<dyn DocumentStore>,
    aggregator: UsageAggregator,
    projector: StatusProjector,
    list_limit: usize,
}

impl ThrottlService {
    /// Create a service over `store`, listing at most `list_limit` APIs
    pub fn new(store: Arc<dyn DocumentStore>, list_limit: usize) -> Self {
        Self {
            aggregator: UsageAggregator::new(store.clone()),
            projector: StatusProjector::new(),
            store,
            list_limit,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Validate and persist a new API configuration
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn register_api(&self, input: ApiConfigInput) -> Result<Stored<ApiConfig>> {
        let config = validate_api_config(input)?;
        let stored = self.store.insert_api(config).await?;

        info!(
            api_id = %stored.id,
            window_seconds = stored.window_seconds,
            max_requests = stored.max_requests,
            "Registered API"
        );
        Ok(stored)
    }

    /// Registered APIs, oldest first, bounded by the list limit
    pub async fn list_apis(&self) -> Result<Vec<Stored<ApiConfig>>> {
        Ok(self.store.find_apis(&ApiFilter::all(), self.list_limit).await?)
    }

    /// A single API configuration
    pub async fn get_api(&self, api_id: &str) -> Result<Stored<ApiConfig>> {
        self.store
            .find_apis(&ApiFilter::by_id(api_id), 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ThrottlError::api_not_found(api_id))
    }

    /// Validate and persist a usage event
    ///
    /// The referenced API is not looked up; usage for unknown ids is stored as is.
    #[instrument(skip(self, input), fields(api_id = %input.api_id))]
    pub async fn record_usage(&self, input: UsageEventInput) -> Result<Stored<UsageEvent>> {
        let event = validate_usage_event(input)?;
        Ok(self.store.insert_usage(event).await?)
    }

    /// Current status of an API
    pub async fn status(&self, api_id: &str) -> Result<PredictedStatus> {
        self.status_at(api_id, Utc::now()).await
    }

    /// Status of an API with its window ending at `now`
    #[instrument(skip(self))]
    pub async fn status_at(&self, api_id: &str, now: DateTime<Utc>) -> Result<PredictedStatus> {
        let api = self.get_api(api_id).await?;
        let current_count = self
            .aggregator
            .windowed_count(&api.id, api.window_seconds, now)
            .await?;

        Ok(self.projector.project(&api, current_count))
    }

    /// Check that the store answers
    pub async fn health(&self) -> HealthReport {
        match self.store.ping().await {
            Ok(()) => HealthReport {
                ok: true,
                error: None,
            },
            Err(err) => {
                warn!(error = %err, "Store health check failed");
                HealthReport {
                    ok: false,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}
