//! In-memory document store
//!
//! Uses DashMap for concurrent access. Usage events are kept per API in a
//! timestamp-ordered map, which serves as the `(api_id, timestamp)` index.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use throttl_common::{ApiConfig, Stored, UsageEvent};

use crate::error::{StoreError, StoreResult};
use crate::filter::{ApiFilter, UsageFilter};
use crate::{stamp, DocumentStore};

/// Usage index key: timestamp, then insertion sequence to keep equal timestamps apart
type UsageKey = (DateTime<Utc>, u64);

/// In-memory storage implementation
#[derive(Default)]
pub struct InMemoryStore {
    /// API configurations by id
    apis: DashMap<String, Stored<ApiConfig>>,

    /// API ids in insertion order
    api_order: RwLock<Vec<String>>,

    /// Usage events by api id, ordered by timestamp
    usage: DashMap<String, BTreeMap<UsageKey, Stored<UsageEvent>>>,

    /// Tie-breaker for events sharing a timestamp
    sequence: AtomicU64,

    closed: AtomicBool,
}

impl InMemoryStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored API configurations
    pub fn api_count(&self) -> usize {
        self.apis.len()
    }

    /// Number of stored usage events across all APIs
    pub fn usage_count(&self) -> usize {
        self.usage.iter().map(|entry| entry.len()).sum()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    fn range_bounds(filter: &UsageFilter) -> (Bound<UsageKey>, Bound<UsageKey>) {
        let lower = filter
            .since
            .map_or(Bound::Unbounded, |since| Bound::Included((since, 0)));
        let upper = filter
            .until
            .map_or(Bound::Unbounded, |until| Bound::Excluded((until, 0)));
        (lower, upper)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_api(&self, config: ApiConfig) -> StoreResult<Stored<ApiConfig>> {
        self.ensure_open()?;

        let stored = stamp(config, Utc::now());
        self.apis.insert(stored.id.clone(), stored.clone());
        self.api_order.write().push(stored.id.clone());

        debug!(api_id = %stored.id, name = %stored.name, "Stored API config");
        Ok(stored)
    }

    async fn find_apis(
        &self,
        filter: &ApiFilter,
        limit: usize,
    ) -> StoreResult<Vec<Stored<ApiConfig>>> {
        self.ensure_open()?;

        if let Some(id) = &filter.id {
            return Ok(self
                .apis
                .get(id)
                .map(|api| api.clone())
                .filter(|api| filter.matches(api))
                .into_iter()
                .take(limit)
                .collect());
        }

        let order = self.api_order.read();
        Ok(order
            .iter()
            .filter_map(|id| self.apis.get(id).map(|api| api.clone()))
            .filter(|api| filter.matches(api))
            .take(limit)
            .collect())
    }

    async fn insert_usage(&self, event: UsageEvent) -> StoreResult<Stored<UsageEvent>> {
        self.ensure_open()?;

        let stored = stamp(event, Utc::now());
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.usage
            .entry(stored.api_id.clone())
            .or_default()
            .insert((stored.timestamp, seq), stored.clone());

        debug!(api_id = %stored.api_id, units = stored.units, "Stored usage event");
        Ok(stored)
    }

    async fn find_usage(
        &self,
        filter: &UsageFilter,
        limit: usize,
    ) -> StoreResult<Vec<Stored<UsageEvent>>> {
        self.ensure_open()?;

        Ok(self
            .usage
            .get(&filter.api_id)
            .map(|events| {
                events
                    .range(Self::range_bounds(filter))
                    .map(|(_, event)| event.clone())
                    .take(limit)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn sum_units(&self, filter: &UsageFilter) -> StoreResult<u64> {
        self.ensure_open()?;

        Ok(self
            .usage
            .get(&filter.api_id)
            .map(|events| {
                events
                    .range(Self::range_bounds(filter))
                    .fold(0u64, |total, (_, event)| total.saturating_add(event.units))
            })
            .unwrap_or(0))
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        self.ensure_open()?;
        debug!("In-memory usage index is maintained on insert");
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.ensure_open()
    }

    async fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
