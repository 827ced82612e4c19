//! Status projection
//!
//! Turns a windowed count into utilization, crossed alert thresholds, and a
//! linear estimate of the seconds left until the limit is reached.
//!
//! The rate is the average over the whole configured window, not recent
//! velocity. Bursty traffic at the end of a long window therefore yields an
//! optimistic estimate.

use throttl_common::{ApiConfig, PredictedStatus, Stored};

/// Stateless projector; every call is a pure function of its inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusProjector;

impl StatusProjector {
    pub fn new() -> Self {
        Self
    }

    /// Derive the status of `api` given `current_count` units in its window
    pub fn project(&self, api: &Stored<ApiConfig>, current_count: u64) -> PredictedStatus {
        let utilization = raw_utilization(current_count, api.max_requests);

        PredictedStatus {
            api_id: api.id.clone(),
            window_seconds: api.window_seconds,
            max_requests: api.max_requests,
            current_count,
            utilization_percent: round_hundredths(utilization),
            projected_hit_in_seconds: projected_hit_in_seconds(
                current_count,
                api.max_requests,
                api.window_seconds,
            ),
            // Compared before rounding: 94.995% has not reached 95
            thresholds_crossed: thresholds_crossed(&api.thresholds, utilization),
        }
    }
}

/// `current_count / max_requests` in percent, rounded to two decimals
pub fn utilization_percent(current_count: u64, max_requests: u64) -> f64 {
    round_hundredths(raw_utilization(current_count, max_requests))
}

fn raw_utilization(current_count: u64, max_requests: u64) -> f64 {
    if max_requests == 0 {
        return 0.0;
    }
    current_count as f64 / max_requests as f64 * 100.0
}

/// Round to two decimals on the exact binary value, ties to even
///
/// Decimal formatting is correctly rounded, so 3.125 becomes 3.12 while
/// 3.1250000001 becomes 3.13. Scaling by 100 first would round the
/// already-inexact product instead.
fn round_hundredths(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Thresholds reached by `utilization_percent`, configuration order preserved
pub fn thresholds_crossed(thresholds: &[u32], utilization_percent: f64) -> Vec<u32> {
    thresholds
        .iter()
        .copied()
        .filter(|&threshold| utilization_percent >= f64::from(threshold))
        .collect()
}

/// Seconds until `max_requests` is reached at the whole-window average rate
///
/// `None` without usage (no meaningful rate). Already over the limit gives `Some(0)`.
pub fn projected_hit_in_seconds(
    current_count: u64,
    max_requests: u64,
    window_seconds: u64,
) -> Option<u64> {
    if current_count == 0 || window_seconds == 0 {
        return None;
    }

    let rate_per_sec = current_count as f64 / window_seconds as f64;
    if rate_per_sec <= 0.0 {
        return None;
    }

    let remaining = max_requests.saturating_sub(current_count);
    Some((remaining as f64 / rate_per_sec).floor() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn api(window_seconds: u64, max_requests: u64) -> Stored<ApiConfig> {
        Stored::new(
            "api-1".to_string(),
            ApiConfig::new("OpenAI", window_seconds, max_requests),
            Utc::now(),
        )
    }

    #[test]
    fn test_no_usage() {
        let status = StatusProjector::new().project(&api(60, 100), 0);

        assert_eq!(status.current_count, 0);
        assert_eq!(status.utilization_percent, 0.0);
        assert!(status.thresholds_crossed.is_empty());
        assert_eq!(status.projected_hit_in_seconds, None);
    }

    #[test]
    fn test_ninety_percent() {
        let status = StatusProjector::new().project(&api(60, 100), 90);

        assert_eq!(status.utilization_percent, 90.0);
        assert_eq!(status.thresholds_crossed, vec![80, 90]);
        // remaining 10 at 1.5/s
        assert_eq!(status.projected_hit_in_seconds, Some(6));
    }

    #[test]
    fn test_over_limit() {
        let status = StatusProjector::new().project(&api(60, 100), 150);

        assert_eq!(status.utilization_percent, 150.0);
        assert_eq!(status.thresholds_crossed, vec![80, 90, 95]);
        assert_eq!(status.projected_hit_in_seconds, Some(0));
        assert!(status.is_exhausted());
    }

    #[test]
    fn test_carries_config_fields() {
        let status = StatusProjector::new().project(&api(3600, 5000), 1);
        assert_eq!(status.api_id, "api-1");
        assert_eq!(status.window_seconds, 3600);
        assert_eq!(status.max_requests, 5000);
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        assert_eq!(utilization_percent(1, 3), 33.33);
        assert_eq!(utilization_percent(2, 3), 66.67);
    }

    #[test]
    fn test_exact_ties_round_to_even() {
        // 1/32 is exactly 3.125%
        assert_eq!(utilization_percent(1, 32), 3.12);
        // 3/32 is exactly 9.375%
        assert_eq!(utilization_percent(3, 32), 9.38);
        assert_eq!(utilization_percent(7, 8), 87.5);
    }

    #[test]
    fn test_thresholds_use_unrounded_utilization() {
        // 968/1019 = 94.995...% displays as 95.0 but has not reached 95
        let config = Stored::new(
            "api-1".to_string(),
            ApiConfig::new("OpenAI", 60, 1019),
            Utc::now(),
        );
        let status = StatusProjector::new().project(&config, 968);

        assert_eq!(status.utilization_percent, 95.0);
        assert_eq!(status.thresholds_crossed, vec![80, 90]);
    }

    #[test]
    fn test_zero_limit_is_zero_utilization() {
        assert_eq!(utilization_percent(10, 0), 0.0);
    }

    #[test]
    fn test_threshold_order_follows_config() {
        assert_eq!(thresholds_crossed(&[95, 10, 50, 10], 60.0), vec![10, 50, 10]);
    }

    #[test]
    fn test_threshold_reached_exactly() {
        assert_eq!(thresholds_crossed(&[80, 90, 95], 80.0), vec![80]);
    }

    #[test]
    fn test_whole_window_rate() {
        // 1 unit over an hour: 1/3600 per second, 99 remaining
        assert_eq!(projected_hit_in_seconds(1, 100, 3600), Some(356_400));
    }

    proptest! {
        #[test]
        fn prop_projection_is_deterministic(count in 0u64..10_000, max in 1u64..10_000, window in 1u64..100_000) {
            let projector = StatusProjector::new();
            let config = api(window, max);
            prop_assert_eq!(projector.project(&config, count), projector.project(&config, count));
        }

        #[test]
        fn prop_crossed_thresholds_are_reached(count in 0u64..10_000, max in 1u64..10_000) {
            let status = StatusProjector::new().project(&api(60, max), count);
            for threshold in &status.thresholds_crossed {
                prop_assert!(status.utilization_percent >= f64::from(*threshold));
            }
        }

        #[test]
        fn prop_projection_present_iff_usage(count in 0u64..10_000, max in 1u64..10_000, window in 1u64..100_000) {
            let hit = projected_hit_in_seconds(count, max, window);
            prop_assert_eq!(hit.is_some(), count > 0);
            if count >= max {
                prop_assert_eq!(hit, if count > 0 { Some(0) } else { None });
            }
        }
    }
}
