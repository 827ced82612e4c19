//! Throttl configuration

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use throttl_store::{DocumentStore, InMemoryStore, RedisStore, RedisStoreConfig};

/// Throttl service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottlConfig {
    /// Service host
    pub host: String,
    /// Service port
    pub port: u16,
    /// Log output format
    pub log_format: LogFormat,
    /// Document store configuration
    pub store: StoreSettings,
    /// Response limits
    pub limits: LimitSettings,
}

impl Default for ThrottlConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_format: LogFormat::Pretty,
            store: StoreSettings::default(),
            limits: LimitSettings::default(),
        }
    }
}

impl ThrottlConfig {
    /// Load configuration from defaults, an optional file, and the environment
    ///
    /// Precedence, lowest first: built-in defaults, `throttl.{toml,yaml,json}`
    /// (or the file named by `THROTTL_CONFIG`), `THROTTL__*` variables with
    /// `__` separating nested keys, and finally `PORT`.
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let file = std::env::var("THROTTL_CONFIG").unwrap_or_else(|_| "throttl".to_string());

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix("THROTTL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;

        // Hosting platforms hand out the port through PORT (takes priority)
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse::<u16>() {
                cfg.port = p;
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("port must be non-zero");
        }
        if self.store.timeout_ms == 0 {
            bail!("store.timeout_ms must be greater than 0");
        }
        if self.limits.list_apis == 0 {
            bail!("limits.list_apis must be greater than 0");
        }
        if self.store.backend == StoreBackend::Redis && self.store.redis_url.is_none() {
            bail!("store.redis_url is required for the redis backend");
        }
        Ok(())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Document store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
}

/// Document store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Which adapter to use
    pub backend: StoreBackend,
    /// Redis connection URL (redis backend only)
    pub redis_url: Option<String>,
    /// Key prefix for the redis backend
    pub key_prefix: String,
    /// Upper bound for a single store round trip
    pub timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: None,
            key_prefix: "throttl".to_string(),
            timeout_ms: 2000,
        }
    }
}

impl StoreSettings {
    /// Construct the configured store adapter
    pub async fn connect(&self) -> Result<Arc<dyn DocumentStore>> {
        match self.backend {
            StoreBackend::Memory => {
                info!("Using in-memory document store");
                Ok(Arc::new(InMemoryStore::new()))
            }
            StoreBackend::Redis => {
                let Some(url) = self.redis_url.clone() else {
                    bail!("store.redis_url is required for the redis backend");
                };
                let store = RedisStore::connect(RedisStoreConfig {
                    url,
                    key_prefix: self.key_prefix.clone(),
                    timeout: Duration::from_millis(self.timeout_ms),
                })
                .await?;
                Ok(Arc::new(store))
            }
        }
    }
}

/// Response limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Maximum number of APIs returned by the list endpoint
    pub list_apis: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            list_apis: crate::DEFAULT_LIST_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ThrottlConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.limits.list_apis, 1000);
    }

    #[test]
    fn test_redis_requires_url() {
        let mut cfg = ThrottlConfig::default();
        cfg.store.backend = StoreBackend::Redis;
        assert!(cfg.validate().is_err());

        cfg.store.redis_url = Some("redis://localhost:6379".into());
        cfg.validate().unwrap();
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut cfg = ThrottlConfig::default();
        cfg.store.timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_backend_names() {
        let backend: StoreBackend = serde_json::from_str(r#""redis""#).unwrap();
        assert_eq!(backend, StoreBackend::Redis);
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);
    }

    #[tokio::test]
    async fn test_memory_backend_connects() {
        let store = StoreSettings::default().connect().await.unwrap();
        store.ping().await.unwrap();
    }
}
