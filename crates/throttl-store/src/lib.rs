//! # Throttl Store
//!
//! Document store adapters. The core only talks to [`DocumentStore`] and the
//! typed filters in [`filter`]; it never sees a backend's query language.
//!
//! - [`InMemoryStore`]: DashMap-backed, used for tests and single-process runs
//! - [`RedisStore`]: JSON records plus timestamp-scored sorted sets

pub mod error;
pub mod filter;
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use throttl_common::{ApiConfig, Stored, UsageEvent};

pub use error::{StoreError, StoreResult};
pub use filter::{ApiFilter, UsageFilter};
pub use memory::InMemoryStore;
pub use redis_store::{RedisStore, RedisStoreConfig};

/// Generic create/query/aggregate operations over the Throttl collections
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist an API configuration, assigning its id and timestamps
    async fn insert_api(&self, config: ApiConfig) -> StoreResult<Stored<ApiConfig>>;

    /// API configurations matching `filter`, oldest first, at most `limit`
    async fn find_apis(&self, filter: &ApiFilter, limit: usize)
        -> StoreResult<Vec<Stored<ApiConfig>>>;

    /// Persist a usage event, assigning its id and timestamps
    async fn insert_usage(&self, event: UsageEvent) -> StoreResult<Stored<UsageEvent>>;

    /// Usage events matching `filter`, ordered by timestamp, at most `limit`
    async fn find_usage(&self, filter: &UsageFilter, limit: usize)
        -> StoreResult<Vec<Stored<UsageEvent>>>;

    /// Sum of `units` over the events matching `filter`
    async fn sum_units(&self, filter: &UsageFilter) -> StoreResult<u64>;

    /// Create whatever indexes the backend needs for the queries above
    async fn ensure_indexes(&self) -> StoreResult<()>;

    /// Connectivity check
    async fn ping(&self) -> StoreResult<()>;

    /// Release backend resources; later calls fail with [`StoreError::Closed`]
    async fn close(&self) -> StoreResult<()>;
}

/// Fresh record identifier (time-ordered UUIDv7)
pub fn generate_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Wrap a record for insertion at `now` with a fresh id
pub fn stamp<T: throttl_common::Document>(record: T, now: DateTime<Utc>) -> Stored<T> {
    Stored::new(generate_id(), record, now)
}
