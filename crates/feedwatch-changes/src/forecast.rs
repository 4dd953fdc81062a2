//! Next-day post volume and engagement from a linear fit over daily history.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use feedwatch_core::{PersistedItem, StateReader};

use crate::detector::ChangeDetector;
use crate::stats::{self, LinearFit};
use crate::types::Forecast;

pub const FORECAST_WINDOW_DAYS: i64 = 14;

/// Fewer distinct days than this falls back to window averages.
const MIN_TREND_DAYS: usize = 3;
const FALLBACK_CONFIDENCE: f64 = 0.3;
const MIN_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.9;

impl<R: StateReader> ChangeDetector<R> {
    /// Forecast tomorrow from the last fourteen days of `source`.
    ///
    /// Storage failures are logged and yield [`Forecast::NONE`].
    pub async fn forecast(&self, source: &str) -> Forecast {
        match self.items_in_window(source, FORECAST_WINDOW_DAYS).await {
            Ok(items) => {
                let forecast = forecast_of(&items);
                tracing::debug!(
                    source,
                    posts = forecast.predicted_daily_posts,
                    engagement = forecast.predicted_daily_engagement,
                    confidence = forecast.trend_confidence,
                    "computed engagement forecast"
                );
                forecast
            }
            Err(e) => {
                tracing::error!(source, error = %e, "engagement forecast failed");
                Forecast::NONE
            }
        }
    }
}

#[derive(Default)]
struct DailyTotals {
    posts: u32,
    score: i64,
}

pub(crate) fn forecast_of(items: &[PersistedItem]) -> Forecast {
    if items.is_empty() {
        return Forecast::NONE;
    }

    let mut by_day: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
    for item in items {
        let day = by_day.entry(item.created_at.date_naive()).or_default();
        day.posts += 1;
        day.score += item.score;
    }

    #[allow(clippy::cast_precision_loss)]
    let scores: Vec<f64> = items.iter().map(|i| i.score as f64).collect();

    if by_day.len() < MIN_TREND_DAYS {
        #[allow(clippy::cast_precision_loss)]
        let per_day = items.len() as f64 / FORECAST_WINDOW_DAYS as f64;
        return Forecast {
            predicted_daily_posts: per_day.max(0.0),
            predicted_daily_engagement: stats::mean(&scores).max(0.0),
            trend_confidence: FALLBACK_CONFIDENCE,
        };
    }

    let post_counts: Vec<f64> = by_day.values().map(|d| f64::from(d.posts)).collect();
    #[allow(clippy::cast_precision_loss)]
    let avg_scores: Vec<f64> = by_day
        .values()
        .map(|d| d.score as f64 / f64::from(d.posts))
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let next_day = post_counts.len() as f64;
    let predicted_posts = extrapolate(&post_counts, next_day);
    let predicted_engagement = extrapolate(&avg_scores, next_day);

    let cv = stats::coefficient_of_variation(&post_counts).unwrap_or(1.0);
    let confidence = (1.0 - cv / 2.0).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

    Forecast {
        predicted_daily_posts: predicted_posts.max(0.0),
        predicted_daily_engagement: predicted_engagement.max(0.0),
        trend_confidence: confidence,
    }
}

/// Fitted value at `x`, or the series mean when no line can be fitted.
fn extrapolate(series: &[f64], x: f64) -> f64 {
    LinearFit::fit(series).map_or_else(|| stats::mean(series), |fit| fit.predict(x))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::days(n)
    }

    fn item(created_at: DateTime<Utc>, score: i64) -> PersistedItem {
        PersistedItem {
            id: 1,
            external_id: "p".to_string(),
            source: "rust".to_string(),
            title: String::new(),
            author: None,
            score,
            comment_count: 0,
            created_at,
            last_updated: created_at,
        }
    }

    #[test]
    fn no_items_forecasts_nothing() {
        assert_eq!(forecast_of(&[]), Forecast::NONE);
    }

    #[test]
    fn short_history_uses_window_average() {
        let items = vec![item(day(0), 10), item(day(0), 20), item(day(1), 30)];
        let forecast = forecast_of(&items);
        assert!((forecast.trend_confidence - 0.3).abs() < f64::EPSILON);
        assert!((forecast.predicted_daily_posts - 3.0 / 14.0).abs() < 1e-9);
        assert!((forecast.predicted_daily_engagement - 20.0).abs() < 1e-9);
    }

    #[test]
    fn linear_growth_extrapolates_one_day_ahead() {
        // Day i has i + 1 posts scoring 10 each.
        let items: Vec<_> = (0..4)
            .flat_map(|d| (0..=d).map(move |_| item(day(d), 10)))
            .collect();
        let forecast = forecast_of(&items);
        assert!((forecast.predicted_daily_posts - 5.0).abs() < 1e-9);
        assert!((forecast.predicted_daily_engagement - 10.0).abs() < 1e-9);
        assert!(forecast.trend_confidence >= 0.1 && forecast.trend_confidence <= 0.9);
    }

    #[test]
    fn steady_history_is_capped_at_high_confidence() {
        let items: Vec<_> = (0..7)
            .flat_map(|d| (0..3).map(move |_| item(day(d), 5)))
            .collect();
        let forecast = forecast_of(&items);
        assert!((forecast.predicted_daily_posts - 3.0).abs() < 1e-9);
        assert!((forecast.trend_confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn falling_series_is_floored_at_zero() {
        let mut items: Vec<_> = (0..10).map(|_| item(day(0), -50)).collect();
        items.extend((0..5).map(|_| item(day(1), -80)));
        items.push(item(day(2), -100));
        let forecast = forecast_of(&items);
        assert!(forecast.predicted_daily_posts >= 0.0);
        assert!(forecast.predicted_daily_engagement.abs() < f64::EPSILON);
    }
}
