//! Predicted status - derived per query, never persisted

use serde::{Deserialize, Serialize};

/// Utilization and limit projection for one API at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedStatus {
    pub api_id: String,
    pub window_seconds: u64,
    pub max_requests: u64,
    /// Units consumed inside the trailing window
    pub current_count: u64,
    /// `current_count / max_requests`, in percent, two decimals
    pub utilization_percent: f64,
    /// Seconds until the limit is reached at the whole-window average rate
    pub projected_hit_in_seconds: Option<u64>,
    /// Configured thresholds already reached, in configuration order
    pub thresholds_crossed: Vec<u32>,
}

impl PredictedStatus {
    /// Whether the window budget is exhausted
    pub fn is_exhausted(&self) -> bool {
        self.current_count >= self.max_requests
    }
}
