//! Posting-cadence classification over a rolling window.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use feedwatch_core::{PersistedItem, StateReader};

use crate::detector::ChangeDetector;
use crate::stats;
use crate::types::ActivityPattern;

pub const ACTIVITY_WINDOW_DAYS: i64 = 14;

const VOLATILITY_CV: f64 = 0.8;
const TREND_CHANGE_RATIO: f64 = 0.3;
const SURGE_MULTIPLIER: f64 = 3.0;

impl<R: StateReader> ChangeDetector<R> {
    /// Classify the last fourteen days of posting for `source`.
    ///
    /// Storage failures are logged and reported as [`ActivityPattern::Dormant`].
    pub async fn classify_activity(&self, source: &str) -> ActivityPattern {
        match self.items_in_window(source, ACTIVITY_WINDOW_DAYS).await {
            Ok(items) => {
                let pattern = classify_daily_counts(&daily_counts(&items));
                tracing::debug!(source, %pattern, items = items.len(), "classified activity");
                pattern
            }
            Err(e) => {
                tracing::error!(source, error = %e, "activity classification failed");
                ActivityPattern::Dormant
            }
        }
    }
}

/// Posts per calendar day (UTC), for days with at least one post, oldest first.
pub(crate) fn daily_counts(items: &[PersistedItem]) -> Vec<f64> {
    let mut by_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for item in items {
        *by_day.entry(item.created_at.date_naive()).or_default() += 1;
    }
    by_day.into_values().map(f64::from).collect()
}

/// Rules are checked in order; the first match wins.
pub(crate) fn classify_daily_counts(counts: &[f64]) -> ActivityPattern {
    if counts.is_empty() {
        return ActivityPattern::Dormant;
    }

    let avg = stats::mean(counts);
    if avg < 1.0 {
        return ActivityPattern::Dormant;
    }

    if counts.len() > 1 {
        let cv = stats::coefficient_of_variation(counts).unwrap_or(0.0);
        if cv > VOLATILITY_CV {
            return ActivityPattern::Volatile;
        }
    }

    let mid = counts.len() / 2;
    if mid > 0 {
        let first_half = stats::mean(&counts[..mid]);
        let second_half = stats::mean(&counts[mid..]);
        let change_ratio = if first_half > 0.0 {
            (second_half - first_half) / first_half
        } else {
            0.0
        };

        if change_ratio > TREND_CHANGE_RATIO {
            return ActivityPattern::Increasing;
        }
        if change_ratio < -TREND_CHANGE_RATIO {
            return ActivityPattern::Decreasing;
        }
    }

    let surge_threshold = avg * SURGE_MULTIPLIER;
    if counts.iter().any(|&c| c >= surge_threshold) {
        return ActivityPattern::Surge;
    }

    ActivityPattern::Steady
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_counts_are_steady() {
        assert_eq!(classify_daily_counts(&[5.0; 14]), ActivityPattern::Steady);
    }

    #[test]
    fn no_days_is_dormant() {
        assert_eq!(classify_daily_counts(&[]), ActivityPattern::Dormant);
    }

    #[test]
    fn high_dispersion_is_volatile() {
        assert_eq!(
            classify_daily_counts(&[1.0, 10.0, 1.0, 12.0, 1.0, 1.0]),
            ActivityPattern::Volatile
        );
    }

    #[test]
    fn rising_halves_are_increasing() {
        assert_eq!(
            classify_daily_counts(&[4.0, 4.0, 4.0, 6.0, 6.0, 6.0]),
            ActivityPattern::Increasing
        );
    }

    #[test]
    fn falling_halves_are_decreasing() {
        assert_eq!(
            classify_daily_counts(&[6.0, 6.0, 6.0, 4.0, 4.0, 4.0]),
            ActivityPattern::Decreasing
        );
    }

    #[test]
    fn single_spike_is_surge() {
        let counts = [
            4.0, 4.0, 4.0, 15.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0,
        ];
        assert_eq!(classify_daily_counts(&counts), ActivityPattern::Surge);
    }

    #[test]
    fn sparse_days_are_dormant() {
        assert_eq!(classify_daily_counts(&[0.0, 1.0]), ActivityPattern::Dormant);
    }

    #[test]
    fn single_day_skips_dispersion_and_halves() {
        assert_eq!(classify_daily_counts(&[3.0]), ActivityPattern::Steady);
    }
}
