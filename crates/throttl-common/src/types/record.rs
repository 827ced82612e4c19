//! Stored record envelope
//!
//! The store adapter appends a generated identifier and write timestamps to
//! every domain record it persists.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A domain record that lives in a named collection
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name the record is stored under
    const COLLECTION: &'static str;
}

/// A persisted record: domain fields plus store-assigned metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    /// Generated identifier
    pub id: String,
    /// Domain fields
    #[serde(flatten)]
    pub record: T,
    /// Write timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp (records are immutable, so equal to `created_at`)
    pub updated_at: DateTime<Utc>,
}

impl<T: Document> Stored<T> {
    /// Wrap a record written at `now`
    pub fn new(id: String, record: T, now: DateTime<Utc>) -> Self {
        Self {
            id,
            record,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }
}

impl<T> std::ops::Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}
