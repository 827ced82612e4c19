//! # Throttl Metering
//!
//! Windowed usage accounting and limit projection.
//!
//! ## Status Formula
//!
//! ```text
//! count        = Σ units where api_id matches and timestamp ≥ now − window
//! utilization  = count / max_requests × 100
//! rate         = count / window_seconds
//! projected    = ⌊max(max_requests − count, 0) / rate⌋
//! ```
//!
//! - [`UsageAggregator`]: reads the windowed count from the document store
//! - [`StatusProjector`]: pure projection of a count into a [`PredictedStatus`]
//!
//! [`PredictedStatus`]: throttl_common::PredictedStatus

pub mod aggregator;
pub mod projector;

pub use aggregator::{window_start, UsageAggregator};
pub use projector::{
    projected_hit_in_seconds, thresholds_crossed, utilization_percent, StatusProjector,
};
