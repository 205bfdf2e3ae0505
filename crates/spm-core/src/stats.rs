//! Descriptive aggregates over millisecond samples.
//!
//! Every function returns `0` for an empty input. Means are rounded
//! **half-up** (`12.5 → 13`) using exact integer arithmetic, so results never
//! depend on floating-point midpoint behaviour.

use serde::{Deserialize, Serialize};

use crate::models::ServiceStatistic;

// ── Rounding ──────────────────────────────────────────────────────────────────

/// `round(numerator / denominator)` with ties rounded up.
///
/// `denominator` must be non-zero.
fn div_round_half_up(numerator: u128, denominator: u128) -> u64 {
    ((2 * numerator + denominator) / (2 * denominator)) as u64
}

// ── Aggregates ────────────────────────────────────────────────────────────────

/// Arithmetic mean rounded half-up; `0` when empty.
pub fn avg(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let sum: u128 = values.iter().map(|&v| u128::from(v)).sum();
    div_round_half_up(sum, values.len() as u128)
}

/// Smallest value; `0` when empty.
pub fn min(values: &[u64]) -> u64 {
    values.iter().copied().min().unwrap_or(0)
}

/// Largest value; `0` when empty.
pub fn max(values: &[u64]) -> u64 {
    values.iter().copied().max().unwrap_or(0)
}

/// Median; `0` when empty.
///
/// An even count averages the two middle elements with the same half-up
/// rule as [`avg`].
pub fn median(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        return sorted[mid];
    }
    let pair = u128::from(sorted[mid - 1]) + u128::from(sorted[mid]);
    div_round_half_up(pair, 2)
}

/// The four aggregates of one sample list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    pub avg: u64,
    pub max: u64,
    pub min: u64,
    pub median: u64,
}

impl Aggregates {
    /// Compute all four aggregates of `values`.
    pub fn of(values: &[u64]) -> Self {
        Self {
            avg: avg(values),
            max: max(values),
            min: min(values),
            median: median(values),
        }
    }

    /// Attach a service and version to these aggregates.
    pub fn for_service(self, service: &str, version: &str) -> ServiceStatistic {
        ServiceStatistic {
            service: service.to_string(),
            version: version.to_string(),
            avg: self.avg,
            max: self.max,
            min: self.min,
            median: self.median,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ── Empty and singleton ──────────────────────────────────────────────────

    #[test]
    fn test_empty_inputs_return_zero() {
        assert_eq!(avg(&[]), 0);
        assert_eq!(median(&[]), 0);
        assert_eq!(min(&[]), 0);
        assert_eq!(max(&[]), 0);
    }

    #[test]
    fn test_singleton_avg_equals_median() {
        assert_eq!(avg(&[7]), 7);
        assert_eq!(median(&[7]), 7);
        assert_eq!(min(&[7]), 7);
        assert_eq!(max(&[7]), 7);
    }

    // ── Median ───────────────────────────────────────────────────────────────

    #[test]
    fn test_median_odd_count() {
        assert_eq!(median(&[10, 20, 30]), 20);
        assert_eq!(median(&[30, 10, 20]), 20);
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median(&[10, 20]), 15);
        assert_eq!(median(&[40, 10, 30, 20]), 25);
    }

    // ── Half-up rounding ─────────────────────────────────────────────────────

    #[test]
    fn test_avg_exact_half_rounds_up() {
        // 12.5
        assert_eq!(avg(&[10, 15]), 13);
        // 10.5
        assert_eq!(avg(&[10, 11]), 11);
        // 0.5
        assert_eq!(avg(&[0, 1]), 1);
    }

    #[test]
    fn test_avg_below_half_rounds_down() {
        // 1.666.. -> 2, 1.333.. -> 1
        assert_eq!(avg(&[1, 2, 2]), 2);
        assert_eq!(avg(&[1, 1, 2]), 1);
        // 12.25
        assert_eq!(avg(&[10, 10, 14, 15]), 12);
    }

    #[test]
    fn test_median_even_half_rounds_up() {
        assert_eq!(median(&[1, 2]), 2);
        assert_eq!(median(&[10, 15]), 13);
        assert_eq!(median(&[100, 101, 1, 200]), 101);
    }

    #[test]
    fn test_avg_does_not_overflow() {
        assert_eq!(avg(&[u64::MAX, u64::MAX]), u64::MAX);
        assert_eq!(median(&[u64::MAX, u64::MAX]), u64::MAX);
    }

    // ── Aggregates ───────────────────────────────────────────────────────────

    #[test]
    fn test_aggregates_of() {
        let agg = Aggregates::of(&[300, 100, 200, 400]);
        assert_eq!(
            agg,
            Aggregates {
                avg: 250,
                max: 400,
                min: 100,
                median: 250,
            }
        );
    }

    #[test]
    fn test_aggregates_for_service() {
        let stat = Aggregates::of(&[5]).for_service("Mail", "2.0.1.0");
        assert_eq!(stat.service, "Mail");
        assert_eq!(stat.version, "2.0.1.0");
        assert_eq!(stat.avg, 5);
        assert_eq!(stat.median, 5);
    }

    // ── Properties ───────────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn prop_bounds_hold(values in prop::collection::vec(0u64..1_000_000, 1..64)) {
            let agg = Aggregates::of(&values);
            prop_assert!(agg.min <= agg.median && agg.median <= agg.max);
            prop_assert!(agg.min <= agg.avg && agg.avg <= agg.max);
        }

        #[test]
        fn prop_order_does_not_matter(values in prop::collection::vec(0u64..1_000_000, 0..64)) {
            let mut reversed = values.clone();
            reversed.reverse();
            let mut sorted = values.clone();
            sorted.sort_unstable();
            prop_assert_eq!(Aggregates::of(&values), Aggregates::of(&reversed));
            prop_assert_eq!(Aggregates::of(&values), Aggregates::of(&sorted));
        }

        #[test]
        fn prop_constant_list_is_fixed_point(value in 0u64..1_000_000, len in 1usize..32) {
            let values = vec![value; len];
            prop_assert_eq!(Aggregates::of(&values), Aggregates { avg: value, max: value, min: value, median: value });
        }
    }
}
