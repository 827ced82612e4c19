//! Windowed usage aggregation
//!
//! Sums the units an API consumed inside its trailing window. Every call
//! recomputes from the store; nothing is cached between calls.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};

use throttl_common::Result;
use throttl_store::{DocumentStore, UsageFilter};

/// Usage aggregator over a document store
#[derive(Clone)]
pub struct UsageAggregator {
    store: Arc<dyn DocumentStore>,
}

impl UsageAggregator {
    /// Create an aggregator reading from `store`
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Filter selecting the events of `api_id` inside the window ending at `now`
    ///
    /// The upper side stays open: events stamped after `now` still count.
    pub fn window_filter(api_id: &str, window_seconds: u64, now: DateTime<Utc>) -> UsageFilter {
        UsageFilter::for_api(api_id).since(window_start(window_seconds, now))
    }

    /// Total units consumed by `api_id` with `timestamp >= now - window_seconds`
    #[instrument(skip(self))]
    pub async fn windowed_count(
        &self,
        api_id: &str,
        window_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let filter = Self::window_filter(api_id, window_seconds, now);
        let count = self.store.sum_units(&filter).await?;

        debug!(current_count = count, "Aggregated usage window");
        Ok(count)
    }
}

/// Start of the trailing window ending at `now`
pub fn window_start(window_seconds: u64, now: DateTime<Utc>) -> DateTime<Utc> {
    let seconds = i64::try_from(window_seconds).unwrap_or(i64::MAX);
    Duration::try_seconds(seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
