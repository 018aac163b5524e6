//! Progress and ETA for migration runs.

use std::time::Duration;

/// Seconds left for a run.
///
/// Before the first item finishes, falls back to `per_item_estimate` for
/// every item. Afterwards extrapolates the average time per processed item
/// over the items that remain.
pub fn estimate_seconds_remaining(
    elapsed: Duration,
    processed: usize,
    total: usize,
    per_item_estimate: Duration,
) -> u64 {
    let remaining = total.saturating_sub(processed);
    if remaining == 0 {
        return 0;
    }
    if processed == 0 {
        return per_item_estimate.as_secs().saturating_mul(total as u64);
    }

    let per_item = elapsed.as_secs_f64() / processed as f64;
    (per_item * remaining as f64).round() as u64
}

/// Share of the run done, 0 to 100. An empty run is complete.
pub fn percent_complete(processed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let pct = processed.min(total) as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_before_first_item() {
        let eta = estimate_seconds_remaining(
            Duration::from_secs(100),
            0,
            4,
            Duration::from_secs(30),
        );
        assert_eq!(eta, 120);
    }

    #[test]
    fn test_extrapolates_average() {
        // 3 items in 60s -> 20s each, 2 left.
        let eta = estimate_seconds_remaining(
            Duration::from_secs(60),
            3,
            5,
            Duration::from_secs(30),
        );
        assert_eq!(eta, 40);
    }

    #[test]
    fn test_done_is_zero() {
        assert_eq!(
            estimate_seconds_remaining(Duration::from_secs(9), 3, 3, Duration::from_secs(30)),
            0
        );
        assert_eq!(
            estimate_seconds_remaining(Duration::ZERO, 0, 0, Duration::from_secs(30)),
            0
        );
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent_complete(0, 0), 100.0);
        assert_eq!(percent_complete(0, 4), 0.0);
        assert_eq!(percent_complete(1, 3), 33.3);
        assert_eq!(percent_complete(3, 3), 100.0);
    }
}
