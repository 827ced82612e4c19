//! Typed query parameters
//!
//! Callers describe what they want with these structs; each adapter
//! translates them into its own query mechanism.

use chrono::{DateTime, Utc};

use throttl_common::{ApiConfig, Stored, UsageEvent};

/// Selects API configurations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiFilter {
    /// Exact record id
    pub id: Option<String>,
    /// Exact name
    pub name: Option<String>,
}

impl ApiFilter {
    /// Match every API
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, api: &Stored<ApiConfig>) -> bool {
        self.id.as_ref().map_or(true, |id| &api.id == id)
            && self.name.as_ref().map_or(true, |name| &api.name == name)
    }
}

/// Selects usage events of one API inside a time range
///
/// `since` is inclusive, `until` exclusive; `None` leaves that side open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageFilter {
    pub api_id: String,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl UsageFilter {
    /// Every event of `api_id`
    pub fn for_api(api_id: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            since: None,
            until: None,
        }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| timestamp >= since)
            && self.until.map_or(true, |until| timestamp < until)
    }

    pub fn matches(&self, event: &UsageEvent) -> bool {
        event.api_id == self.api_id && self.contains(event.timestamp)
    }
}
