//! Redis document store
//!
//! Layout under the configured prefix:
//! - `{prefix}:api:{id}` - API configuration as JSON
//! - `{prefix}:api:index` - sorted set of API ids scored by creation millis
//! - `{prefix}:usageevent:{api_id}` - sorted set of usage events (JSON members)
//!   scored by event timestamp millis, so window queries are `ZRANGEBYSCORE`
//!
//! Commands go through a [`ConnectionManager`], which reconnects after the
//! server drops the connection. The manager itself is created lazily and
//! discarded on `close`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisResult};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use throttl_common::{ApiConfig, Document, Stored, UsageEvent};

use crate::error::{StoreError, StoreResult};
use crate::filter::{ApiFilter, UsageFilter};
use crate::{stamp, DocumentStore};

/// Redis store settings
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Connection URL, e.g. `redis://localhost:6379`
    pub url: String,
    /// Prefix for every key
    pub key_prefix: String,
    /// Upper bound for a single store round trip
    pub timeout: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "throttl".to_string(),
            timeout: Duration::from_millis(2000),
        }
    }
}

/// Redis-backed document store
pub struct RedisStore {
    /// Redis client
    client: Client,
    /// Shared reconnecting connection, created on first use
    connection: Arc<RwLock<Option<ConnectionManager>>>,
    prefix: String,
    timeout: Duration,
    closed: AtomicBool,
}

impl RedisStore {
    /// Open a client and establish the first connection
    pub async fn connect(config: RedisStoreConfig) -> StoreResult<Self> {
        let store = Self::new(config)?;
        store.get_connection().await?;

        info!(prefix = %store.prefix, "Connected to Redis document store");
        Ok(store)
    }

    /// Build the client without opening a connection
    fn new(config: RedisStoreConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| StoreError::Connection(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            prefix: config.key_prefix,
            timeout: config.timeout,
            closed: AtomicBool::new(false),
        })
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    fn api_key(&self, id: &str) -> String {
        format!("{}:{}:{}", self.prefix, ApiConfig::COLLECTION, id)
    }

    fn api_index_key(&self) -> String {
        format!("{}:{}:index", self.prefix, ApiConfig::COLLECTION)
    }

    fn usage_key(&self, api_id: &str) -> String {
        format!("{}:{}:{}", self.prefix, UsageEvent::COLLECTION, api_id)
    }

    /// Bound a Redis round trip by the configured timeout
    async fn bounded<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result.map_err(|e| StoreError::from_redis(e, self.timeout_ms())),
            Err(_) => {
                warn!(timeout_ms = self.timeout_ms(), "Redis operation timed out");
                Err(StoreError::Timeout(self.timeout_ms()))
            }
        }
    }

    /// Get the shared connection manager, creating it on first use
    ///
    /// A failed attempt leaves the slot empty so the next call retries.
    async fn get_connection(&self) -> StoreResult<ConnectionManager> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }

        let guard = self.connection.read().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        drop(guard);

        let mut guard = self.connection.write().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let connection = self
            .bounded(ConnectionManager::new(self.client.clone()))
            .await
            .map_err(|e| match e {
                StoreError::Timeout(ms) => StoreError::Timeout(ms),
                other => StoreError::Connection(other.to_string()),
            })?;

        *guard = Some(connection.clone());
        Ok(connection)
    }

    async fn load_apis(
        &self,
        conn: &mut ConnectionManager,
        ids: &[String],
    ) -> StoreResult<Vec<Stored<ApiConfig>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| self.api_key(id)).collect();
        let raw: Vec<Option<String>> = self.bounded(conn.mget(&keys)).await?;

        raw.into_iter()
            .flatten()
            .map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .collect()
    }

    async fn load_usage(
        &self,
        filter: &UsageFilter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Stored<UsageEvent>>> {
        let key = self.usage_key(&filter.api_id);
        let (min, max) = score_bounds(filter);
        let mut conn = self.get_connection().await?;

        let Some(limit) = limit else {
            let members: Vec<String> = self.bounded(conn.zrangebyscore(&key, &min, &max)).await?;
            let mut events = Vec::with_capacity(members.len());
            decode_matching(filter, members, usize::MAX, &mut events)?;
            return Ok(events);
        };

        // Boundary members can be dropped after decoding, so page until the limit is met
        let mut events = Vec::with_capacity(limit);
        let mut offset = 0isize;
        loop {
            let page: Vec<String> = self
                .bounded(conn.zrangebyscore_limit(&key, &min, &max, offset, limit as isize))
                .await?;
            let fetched = page.len();
            decode_matching(filter, page, limit, &mut events)?;

            if events.len() >= limit || fetched < limit {
                return Ok(events);
            }
            offset += fetched as isize;
        }
    }
}

/// Decode sorted-set members into `out`, keeping those inside the exact
/// filter bounds, until `out` holds `limit` events
///
/// Scores are whole milliseconds, so a member can match the score range
/// and still fall outside the filter.
fn decode_matching(
    filter: &UsageFilter,
    members: Vec<String>,
    limit: usize,
    out: &mut Vec<Stored<UsageEvent>>,
) -> StoreResult<()> {
    for json in members {
        if out.len() >= limit {
            break;
        }
        let event: Stored<UsageEvent> = serde_json::from_str(&json)?;
        if filter.contains(event.timestamp) {
            out.push(event);
        }
    }
    Ok(())
}

/// Sorted-set score for a timestamp
fn score(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// `ZRANGEBYSCORE` bounds for a filter, widened to whole milliseconds
///
/// Both ends are inclusive; the exclusive `until` is enforced on the decoded events.
fn score_bounds(filter: &UsageFilter) -> (String, String) {
    let min = filter
        .since
        .map_or_else(|| "-inf".to_string(), |since| score(since).to_string());
    let max = filter
        .until
        .map_or_else(|| "+inf".to_string(), |until| score(until).to_string());
    (min, max)
}

/// Saturating sum of event units
fn total_units(events: &[Stored<UsageEvent>]) -> u64 {
    events
        .iter()
        .fold(0u64, |total, event| total.saturating_add(event.units))
}

#[async_trait]
impl DocumentStore for RedisStore {
    #[instrument(skip(self, config), fields(name = %config.name))]
    async fn insert_api(&self, config: ApiConfig) -> StoreResult<Stored<ApiConfig>> {
        let stored = stamp(config, Utc::now());
        let json = serde_json::to_string(&stored)?;
        let mut conn = self.get_connection().await?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .set(self.api_key(&stored.id), json)
            .ignore()
            .zadd(self.api_index_key(), &stored.id, score(stored.created_at))
            .ignore();
        self.bounded(pipe.query_async::<_, ()>(&mut conn)).await?;

        debug!(api_id = %stored.id, "Stored API config");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn find_apis(
        &self,
        filter: &ApiFilter,
        limit: usize,
    ) -> StoreResult<Vec<Stored<ApiConfig>>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.get_connection().await?;

        if let Some(id) = &filter.id {
            let apis = self.load_apis(&mut conn, std::slice::from_ref(id)).await?;
            return Ok(apis.into_iter().filter(|api| filter.matches(api)).collect());
        }

        // Name filters are applied client side, so they need the full index
        let stop = if filter.name.is_some() {
            -1
        } else {
            limit as isize - 1
        };
        let ids: Vec<String> = self
            .bounded(conn.zrange(self.api_index_key(), 0, stop))
            .await?;

        let apis = self.load_apis(&mut conn, &ids).await?;
        Ok(apis
            .into_iter()
            .filter(|api| filter.matches(api))
            .take(limit)
            .collect())
    }

    #[instrument(skip(self, event), fields(api_id = %event.api_id))]
    async fn insert_usage(&self, event: UsageEvent) -> StoreResult<Stored<UsageEvent>> {
        let stored = stamp(event, Utc::now());
        let json = serde_json::to_string(&stored)?;
        let key = self.usage_key(&stored.api_id);
        let mut conn = self.get_connection().await?;

        self.bounded(conn.zadd::<_, _, _, ()>(&key, json, score(stored.timestamp)))
            .await?;

        debug!(event_id = %stored.id, units = stored.units, "Stored usage event");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn find_usage(
        &self,
        filter: &UsageFilter,
        limit: usize,
    ) -> StoreResult<Vec<Stored<UsageEvent>>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.load_usage(filter, Some(limit)).await
    }

    #[instrument(skip(self))]
    async fn sum_units(&self, filter: &UsageFilter) -> StoreResult<u64> {
        let events = self.load_usage(filter, None).await?;
        Ok(total_units(&events))
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        // Sorted sets double as the (api_id, timestamp) index; only check reachability
        self.ping().await?;
        debug!(prefix = %self.prefix, "Redis sorted-set indexes ready");
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        self.connection.write().await.take();
        info!("Closed Redis document store");
        Ok(())
    }
}
