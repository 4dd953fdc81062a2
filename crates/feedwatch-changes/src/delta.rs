//! Engagement movement between a recorded baseline and a fresh observation.

use chrono::{DateTime, Utc};
use feedwatch_core::{PersistedItem, StateReader};

use crate::detector::ChangeDetector;
use crate::types::{EngagementDelta, MIN_TIME_SPAN_HOURS, SIGNIFICANT_SCORE_DELTA};

impl EngagementDelta {
    /// Compare `previous` against the current counts observed at `current_timestamp`.
    #[must_use]
    pub fn between(
        item_id: &str,
        previous: &PersistedItem,
        current_score: i64,
        current_comments: i64,
        current_timestamp: DateTime<Utc>,
    ) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let elapsed_hours =
            (current_timestamp - previous.last_updated).num_milliseconds() as f64 / 3_600_000.0;
        let time_span_hours = elapsed_hours.max(MIN_TIME_SPAN_HOURS);

        let score_delta = current_score - previous.score;
        let comments_delta = current_comments - previous.comment_count;
        #[allow(clippy::cast_precision_loss)]
        let engagement_rate = score_delta as f64 / time_span_hours;

        Self {
            item_id: item_id.to_string(),
            score_delta,
            comments_delta,
            previous_score: previous.score,
            current_score,
            previous_comments: previous.comment_count,
            current_comments,
            time_span_hours,
            engagement_rate,
            is_trending_up: score_delta > 0,
            is_trending_down: score_delta < 0,
            has_significant_change: score_delta.abs() >= SIGNIFICANT_SCORE_DELTA,
        }
    }
}

impl<R: StateReader> ChangeDetector<R> {
    /// Engagement delta for one item against its recorded baseline.
    ///
    /// `None` when the item has never been recorded, or when the lookup fails
    /// (logged); callers must tolerate a missing delta.
    pub async fn calculate_engagement_delta(
        &self,
        external_id: &str,
        current_score: i64,
        current_comments: i64,
        current_timestamp: DateTime<Utc>,
    ) -> Option<EngagementDelta> {
        let previous = match self.reader.get_item(external_id).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                tracing::debug!(item_id = external_id, "no baseline recorded for item");
                return None;
            }
            Err(e) => {
                tracing::error!(item_id = external_id, error = %e, "baseline lookup failed");
                return None;
            }
        };

        let delta = EngagementDelta::between(
            external_id,
            &previous,
            current_score,
            current_comments,
            current_timestamp,
        );
        tracing::debug!(
            item_id = external_id,
            score_delta = delta.score_delta,
            comments_delta = delta.comments_delta,
            rate_per_hour = delta.engagement_rate,
            "calculated engagement delta"
        );
        Some(delta)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn baseline(score: i64, comments: i64, last_updated: DateTime<Utc>) -> PersistedItem {
        PersistedItem {
            id: 1,
            external_id: "p1".to_string(),
            source: "rust".to_string(),
            title: "Baseline".to_string(),
            author: None,
            score,
            comment_count: comments,
            created_at: last_updated,
            last_updated,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn deltas_reconcile_with_counts() {
        let prev = baseline(100, 20, t0());
        let delta = EngagementDelta::between("p1", &prev, 150, 25, t0() + Duration::hours(2));
        assert_eq!(delta.previous_score + delta.score_delta, delta.current_score);
        assert_eq!(
            delta.previous_comments + delta.comments_delta,
            delta.current_comments
        );
        assert_eq!(delta.score_delta, 50);
        assert_eq!(delta.comments_delta, 5);
        assert!((delta.time_span_hours - 2.0).abs() < 1e-9);
        assert!((delta.engagement_rate - 25.0).abs() < 1e-9);
        assert!(delta.is_trending_up);
        assert!(!delta.is_trending_down);
        assert!(delta.has_significant_change);
    }

    #[test]
    fn time_span_is_floored() {
        let prev = baseline(10, 0, t0());
        let same_instant = EngagementDelta::between("p1", &prev, 11, 0, t0());
        assert!((same_instant.time_span_hours - MIN_TIME_SPAN_HOURS).abs() < f64::EPSILON);
        assert!((same_instant.engagement_rate - 1000.0).abs() < 1e-6);

        let clock_skew = EngagementDelta::between("p1", &prev, 11, 0, t0() - Duration::hours(1));
        assert!(clock_skew.time_span_hours >= MIN_TIME_SPAN_HOURS);
    }

    #[test]
    fn falling_score_trends_down() {
        let prev = baseline(100, 20, t0());
        let delta = EngagementDelta::between("p1", &prev, 80, 15, t0() + Duration::hours(1));
        assert_eq!(delta.score_delta, -20);
        assert_eq!(delta.comments_delta, -5);
        assert!(!delta.is_trending_up);
        assert!(delta.is_trending_down);
        assert!(delta.has_significant_change);
    }

    #[test]
    fn unchanged_score_is_neither_up_nor_down() {
        let prev = baseline(100, 20, t0());
        let delta = EngagementDelta::between("p1", &prev, 100, 30, t0() + Duration::hours(1));
        assert!(!delta.is_trending_up);
        assert!(!delta.is_trending_down);
        assert!(!delta.has_significant_change);
    }

    #[test]
    fn significance_threshold_is_inclusive() {
        let prev = baseline(100, 0, t0());
        let at_threshold = EngagementDelta::between("p1", &prev, 90, 0, t0() + Duration::hours(1));
        assert!(at_threshold.has_significant_change);
        let below = EngagementDelta::between("p1", &prev, 109, 0, t0() + Duration::hours(1));
        assert!(!below.has_significant_change);
    }
}
