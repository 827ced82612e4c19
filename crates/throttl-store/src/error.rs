//! Store adapter errors

use throttl_common::ThrottlError;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors from document store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Store is closed")]
    Closed,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Classify a driver error; driver timeouts report the adapter's own bound
    pub fn from_redis(err: redis::RedisError, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(timeout_ms)
        } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<StoreError> for ThrottlError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Serialization(msg) => ThrottlError::Serialization(msg),
            other => ThrottlError::StoreUnavailable(other.to_string()),
        }
    }
}
