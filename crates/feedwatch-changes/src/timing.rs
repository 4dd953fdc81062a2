//! When a source's items do best: hour of day, weekday, and busy periods.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use feedwatch_core::{PersistedItem, StateReader};

use crate::detector::ChangeDetector;
use crate::stats;
use crate::types::PeakPeriod;

/// Reported when there is nothing to rank (noon UTC).
pub const DEFAULT_BEST_HOUR: u32 = 12;

pub const BEST_HOUR_WINDOW_DAYS: i64 = 30;

const COMMENT_WEIGHT: i64 = 2;
const PEAK_MULTIPLIER: f64 = 1.2;

impl<R: StateReader> ChangeDetector<R> {
    /// Hour of day (UTC) with the highest mean engagement over the last thirty days.
    pub async fn best_hour(&self, source: &str) -> u32 {
        match self.items_in_window(source, BEST_HOUR_WINDOW_DAYS).await {
            Ok(items) => {
                let hour = best_hour_of(&items);
                tracing::debug!(source, hour, "computed best posting hour");
                hour
            }
            Err(e) => {
                tracing::error!(source, error = %e, "best hour calculation failed");
                DEFAULT_BEST_HOUR
            }
        }
    }
}

/// Engagement = score + 2 x comments, averaged per hour. Ties go to the earlier hour.
pub(crate) fn best_hour_of(items: &[PersistedItem]) -> u32 {
    let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for item in items {
        #[allow(clippy::cast_precision_loss)]
        let engagement = (item.score + COMMENT_WEIGHT * item.comment_count) as f64;
        by_hour
            .entry(item.created_at.hour())
            .or_default()
            .push(engagement);
    }
    argmax_mean(&by_hour).unwrap_or(DEFAULT_BEST_HOUR)
}

/// Weekday (Monday = 0) with the highest mean score. Ties go to the earlier day.
pub(crate) fn best_weekday_of(items: &[PersistedItem]) -> u32 {
    let mut by_weekday: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for item in items {
        #[allow(clippy::cast_precision_loss)]
        let score = item.score as f64;
        by_weekday
            .entry(item.created_at.weekday().num_days_from_monday())
            .or_default()
            .push(score);
    }
    argmax_mean(&by_weekday).unwrap_or(0)
}

/// Buckets whose item count exceeds 1.2x the mean of the non-empty buckets.
pub(crate) fn peak_periods_of(items: &[PersistedItem]) -> Vec<PeakPeriod> {
    let mut counts: BTreeMap<PeakPeriod, u32> = BTreeMap::new();
    for item in items {
        *counts
            .entry(PeakPeriod::from_hour(item.created_at.hour()))
            .or_default() += 1;
    }
    if counts.is_empty() {
        return Vec::new();
    }

    let values: Vec<f64> = counts.values().copied().map(f64::from).collect();
    let threshold = stats::mean(&values) * PEAK_MULTIPLIER;

    PeakPeriod::ALL
        .into_iter()
        .filter(|period| counts.get(period).is_some_and(|&c| f64::from(c) > threshold))
        .collect()
}

fn argmax_mean(groups: &BTreeMap<u32, Vec<f64>>) -> Option<u32> {
    let mut best: Option<(u32, f64)> = None;
    for (&key, values) in groups {
        let avg = stats::mean(values);
        if best.is_none_or(|(_, best_avg)| avg > best_avg) {
            best = Some((key, avg));
        }
    }
    best.map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn item_at(created_at: DateTime<Utc>, score: i64, comments: i64) -> PersistedItem {
        PersistedItem {
            id: 1,
            external_id: "p".to_string(),
            source: "rust".to_string(),
            title: String::new(),
            author: None,
            score,
            comment_count: comments,
            created_at,
            last_updated: created_at,
        }
    }

    fn at_hour(hour: u32, score: i64, comments: i64) -> PersistedItem {
        // 2025-03-10 is a Monday.
        item_at(
            Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap(),
            score,
            comments,
        )
    }

    #[test]
    fn best_hour_weights_comments() {
        let items = vec![at_hour(9, 100, 0), at_hour(15, 50, 30), at_hour(15, 60, 30)];
        assert_eq!(best_hour_of(&items), 15);
    }

    #[test]
    fn best_hour_defaults_to_noon() {
        assert_eq!(best_hour_of(&[]), DEFAULT_BEST_HOUR);
    }

    #[test]
    fn best_hour_tie_takes_earliest() {
        let items = vec![at_hour(20, 10, 0), at_hour(4, 10, 0)];
        assert_eq!(best_hour_of(&items), 4);
    }

    #[test]
    fn best_weekday_uses_mean_score() {
        let monday = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let wednesday = Utc.with_ymd_and_hms(2025, 3, 12, 12, 0, 0).unwrap();
        let items = vec![
            item_at(monday, 10, 0),
            item_at(monday, 20, 0),
            item_at(wednesday, 40, 0),
        ];
        assert_eq!(best_weekday_of(&items), 2);
        assert_eq!(best_weekday_of(&[]), 0);
    }

    #[test]
    fn peak_periods_ignore_empty_buckets() {
        // Morning 4, afternoon 1, evening 1: mean 2, threshold 2.4.
        let mut items: Vec<_> = (0..4).map(|_| at_hour(8, 1, 0)).collect();
        items.push(at_hour(13, 1, 0));
        items.push(at_hour(22, 1, 0));
        assert_eq!(peak_periods_of(&items), vec![PeakPeriod::Morning]);
    }

    #[test]
    fn even_spread_has_no_peaks() {
        let items: Vec<_> = [1, 7, 13, 19].iter().map(|&h| at_hour(h, 1, 0)).collect();
        assert!(peak_periods_of(&items).is_empty());
        assert!(peak_periods_of(&[]).is_empty());
    }

    #[test]
    fn peak_periods_follow_day_order() {
        let mut items: Vec<_> = (0..5).map(|_| at_hour(20, 1, 0)).collect();
        items.extend((0..5).map(|_| at_hour(2, 1, 0)));
        items.push(at_hour(10, 1, 0));
        items.push(at_hour(14, 1, 0));
        assert_eq!(
            peak_periods_of(&items),
            vec![PeakPeriod::LateNight, PeakPeriod::Evening]
        );
    }
}
