//! Source-level trend report composed from the individual analyses.

use chrono::{DateTime, Duration, Utc};
use feedwatch_core::{PersistedItem, StateReader};

use crate::detector::ChangeDetector;
use crate::stats;
use crate::timing::{best_weekday_of, peak_periods_of};
use crate::types::TrendReport;

/// Mean, median, and population spread of item scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoreSummary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl ScoreSummary {
    pub(crate) fn of(items: &[PersistedItem]) -> Self {
        let mut scores: Vec<i64> = items.iter().map(|i| i.score).collect();
        scores.sort_unstable();
        #[allow(clippy::cast_precision_loss)]
        let as_f64: Vec<f64> = scores.iter().map(|&s| s as f64).collect();

        // Index len/2: the upper middle for even counts.
        let median = as_f64.get(as_f64.len() / 2).copied().unwrap_or(0.0);
        let std_dev = if as_f64.len() > 1 {
            stats::population_std_dev(&as_f64)
        } else {
            0.0
        };

        Self {
            mean: stats::mean(&as_f64),
            median,
            std_dev,
        }
    }
}

impl<R: StateReader> ChangeDetector<R> {
    /// Trend report for `source` over the last `days` days.
    ///
    /// Never fails: an empty window, a zero-day window, a window reaching past
    /// the representable time range, or a storage error all produce
    /// [`TrendReport::empty`]. Activity, best hour, and forecast use
    /// their own fixed windows regardless of `days`.
    pub async fn trend_report(&self, source: &str, days: u32) -> TrendReport {
        let end = self.now();
        let Some(start) = Duration::try_days(i64::from(days))
            .and_then(|span| end.checked_sub_signed(span))
        else {
            tracing::warn!(source, days, "trend window out of range");
            return TrendReport::empty(source, days, DateTime::<Utc>::MIN_UTC, end);
        };
        let empty = || TrendReport::empty(source, days, start, end);

        if days == 0 {
            tracing::warn!(source, "trend report requested for a zero-day window");
            return empty();
        }

        let items = match self.reader.get_items_in_range(source, start, end).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(source, days, error = %e, "trend report failed");
                return empty();
            }
        };
        if items.is_empty() {
            tracing::debug!(source, days, "no items in trend window");
            return empty();
        }

        let total_posts = items.len();
        let total_comments: i64 = items.iter().map(|i| i.comment_count).sum();
        let day_count = f64::from(days);
        #[allow(clippy::cast_precision_loss)]
        let posts = total_posts as f64;
        let avg_posts_per_day = posts / day_count;
        #[allow(clippy::cast_precision_loss)]
        let avg_comments_per_day = total_comments as f64 / day_count;

        let scores = ScoreSummary::of(&items);
        let activity_pattern = self.classify_activity(source).await;
        let best_hour = self.best_hour(source).await;
        let forecast = self.forecast(source).await;

        // Current daily rate against a half-period baseline.
        let is_trending_up = days > 1 && avg_posts_per_day > posts / (day_count * 2.0);
        let is_trending_down = !is_trending_up && total_posts > 0;

        let report = TrendReport {
            source: source.to_string(),
            analysis_period_days: days,
            start,
            end,
            total_posts,
            total_comments,
            avg_posts_per_day,
            avg_comments_per_day,
            avg_score: scores.mean,
            median_score: scores.median,
            score_stddev: scores.std_dev,
            activity_pattern,
            best_hour,
            best_weekday: best_weekday_of(&items),
            peak_periods: peak_periods_of(&items),
            predicted_daily_posts: forecast.predicted_daily_posts,
            predicted_daily_engagement: forecast.predicted_daily_engagement,
            trend_confidence: forecast.trend_confidence,
            is_trending_up,
            is_trending_down,
        };

        tracing::info!(
            source,
            days,
            total_posts,
            pattern = %report.activity_pattern,
            "trend report built"
        );
        report
    }
}
