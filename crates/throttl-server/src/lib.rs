//! # Throttl Server
//!
//! HTTP surface for Throttl: register APIs with a sliding rate-limit window,
//! report usage against them, and query how close each one is to its limit.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  axum Router (api)                      │
//! │   /apis   /usage   /status/:api_id   /health   /test    │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │
//! ┌───────────────────────────┴─────────────────────────────┐
//! │                    ThrottlService                       │
//! │  ┌──────────────────┐        ┌──────────────────┐       │
//! │  │ UsageAggregator  │ ─────▶ │ StatusProjector  │       │
//! │  └────────┬─────────┘        └──────────────────┘       │
//! └───────────┼─────────────────────────────────────────────┘
//!             │
//! ┌───────────┴─────────────────────────────────────────────┐
//! │          DocumentStore (in-memory or Redis)             │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod service;

pub use api::router;
pub use config::{LogFormat, StoreBackend, ThrottlConfig};
pub use error::ApiError;
pub use service::{HealthReport, ThrottlService};

/// Throttl server version
pub const THROTTL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default upper bound on the API listing
pub const DEFAULT_LIST_LIMIT: usize = 1000;
