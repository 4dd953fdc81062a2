//! Derived results. Computed fresh on every call; nothing here is persisted.

use chrono::{DateTime, Utc};
use feedwatch_core::{ObservedComment, PersistedItem};
use serde::Serialize;

/// Minimum `|score_delta|` for a change to count as significant.
pub const SIGNIFICANT_SCORE_DELTA: i64 = 10;

/// Floor applied to the observation gap so rates never divide by zero.
pub const MIN_TIME_SPAN_HOURS: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    New,
    ScoreChange,
    CommentChange,
    BothChange,
}

impl UpdateType {
    /// Classify a known item's movement. `None` when nothing moved.
    #[must_use]
    pub fn from_changes(score_changed: bool, comments_changed: bool) -> Option<Self> {
        match (score_changed, comments_changed) {
            (true, true) => Some(UpdateType::BothChange),
            (true, false) => Some(UpdateType::ScoreChange),
            (false, true) => Some(UpdateType::CommentChange),
            (false, false) => None,
        }
    }
}

impl std::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateType::New => write!(f, "new"),
            UpdateType::ScoreChange => write!(f, "score_change"),
            UpdateType::CommentChange => write!(f, "comment_change"),
            UpdateType::BothChange => write!(f, "both_change"),
        }
    }
}

/// Score and comment movement of one item between two observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementDelta {
    /// External id of the item.
    pub item_id: String,
    pub score_delta: i64,
    pub comments_delta: i64,
    pub previous_score: i64,
    pub current_score: i64,
    pub previous_comments: i64,
    pub current_comments: i64,
    /// Hours between the baseline and this observation, floored at [`MIN_TIME_SPAN_HOURS`].
    pub time_span_hours: f64,
    /// Score change per hour.
    pub engagement_rate: f64,
    pub is_trending_up: bool,
    pub is_trending_down: bool,
    pub has_significant_change: bool,
}

/// A new or changed item found in an observed batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemUpdate {
    /// Internal storage id; `None` for items not yet recorded.
    pub item_id: Option<i64>,
    pub external_id: String,
    pub source: String,
    pub title: String,
    pub update_type: UpdateType,
    pub current_score: i64,
    pub current_comments: i64,
    pub current_timestamp: DateTime<Utc>,
    pub previous_score: Option<i64>,
    pub previous_comments: Option<i64>,
    pub previous_timestamp: Option<DateTime<Utc>>,
    pub engagement_delta: Option<EngagementDelta>,
}

/// Everything one check cycle found for a source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeDetectionResult {
    pub source: String,
    pub detected_at: DateTime<Utc>,
    pub new_items: Vec<ItemUpdate>,
    pub updated_items: Vec<ItemUpdate>,
    pub total_new: usize,
    pub total_updated: usize,
    pub significant_changes: usize,
    pub trending_up: usize,
    pub trending_down: usize,
}

impl ChangeDetectionResult {
    #[must_use]
    pub fn from_updates(
        source: &str,
        detected_at: DateTime<Utc>,
        new_items: Vec<ItemUpdate>,
        updated_items: Vec<ItemUpdate>,
    ) -> Self {
        let deltas = || {
            updated_items
                .iter()
                .filter_map(|u| u.engagement_delta.as_ref())
        };
        let significant_changes = deltas().filter(|d| d.has_significant_change).count();
        let trending_up = deltas().filter(|d| d.is_trending_up).count();
        let trending_down = deltas().filter(|d| d.is_trending_down).count();

        Self {
            source: source.to_string(),
            detected_at,
            total_new: new_items.len(),
            total_updated: updated_items.len(),
            significant_changes,
            trending_up,
            trending_down,
            new_items,
            updated_items,
        }
    }
}

/// A recorded item ranked by how fast it is gaining score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingItem {
    pub item: PersistedItem,
    pub delta: EngagementDelta,
}

/// An observed comment whose score moved since it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatedComment {
    #[serde(flatten)]
    pub comment: ObservedComment,
    pub score_delta: i64,
    pub previous_score: i64,
    pub current_score: i64,
    /// When the baseline for this comment was recorded.
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommentTreeShape {
    pub item_id: i64,
    pub total_comments: usize,
    pub top_level_count: usize,
    pub total_replies: usize,
    /// Item = 1, direct comments = 2, and so on. `0` when there are no comments.
    pub max_depth: usize,
}

impl CommentTreeShape {
    #[must_use]
    pub fn empty(item_id: i64) -> Self {
        Self {
            item_id,
            total_comments: 0,
            top_level_count: 0,
            total_replies: 0,
            max_depth: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopNewComment {
    pub comment_id: String,
    pub author: Option<String>,
    pub score: i64,
    pub body_preview: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreChangeDistribution {
    pub positive: usize,
    pub negative: usize,
    /// Recorded comments seen again with the same score.
    pub unchanged: usize,
    pub total_score_change: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentMetrics {
    pub item_id: i64,
    pub new_count: usize,
    pub updated_count: usize,
    pub top_new_comment: Option<TopNewComment>,
    pub score_change_distribution: ScoreChangeDistribution,
    pub avg_score_change: f64,
}

impl CommentMetrics {
    #[must_use]
    pub fn empty(item_id: i64) -> Self {
        Self {
            item_id,
            new_count: 0,
            updated_count: 0,
            top_new_comment: None,
            score_change_distribution: ScoreChangeDistribution::default(),
            avg_score_change: 0.0,
        }
    }
}

/// Posting cadence of a source over the recent window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityPattern {
    Steady,
    Increasing,
    Decreasing,
    Volatile,
    Dormant,
    Surge,
}

impl std::fmt::Display for ActivityPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityPattern::Steady => write!(f, "steady"),
            ActivityPattern::Increasing => write!(f, "increasing"),
            ActivityPattern::Decreasing => write!(f, "decreasing"),
            ActivityPattern::Volatile => write!(f, "volatile"),
            ActivityPattern::Dormant => write!(f, "dormant"),
            ActivityPattern::Surge => write!(f, "surge"),
        }
    }
}

/// Fixed 6-hour buckets of the (UTC) day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakPeriod {
    LateNight,
    Morning,
    Afternoon,
    Evening,
}

impl PeakPeriod {
    pub const ALL: [PeakPeriod; 4] = [
        PeakPeriod::LateNight,
        PeakPeriod::Morning,
        PeakPeriod::Afternoon,
        PeakPeriod::Evening,
    ];

    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => PeakPeriod::LateNight,
            6..=11 => PeakPeriod::Morning,
            12..=17 => PeakPeriod::Afternoon,
            _ => PeakPeriod::Evening,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    pub predicted_daily_posts: f64,
    pub predicted_daily_engagement: f64,
    /// In `[0.1, 0.9]` for fitted forecasts; `0.3` for the naive fallback; `0.0` with no data.
    pub trend_confidence: f64,
}

impl Forecast {
    pub const NONE: Forecast = Forecast {
        predicted_daily_posts: 0.0,
        predicted_daily_engagement: 0.0,
        trend_confidence: 0.0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub source: String,
    pub analysis_period_days: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_posts: usize,
    pub total_comments: i64,
    pub avg_posts_per_day: f64,
    pub avg_comments_per_day: f64,
    pub avg_score: f64,
    pub median_score: f64,
    pub score_stddev: f64,
    pub activity_pattern: ActivityPattern,
    /// Hour of day (UTC, 0-23).
    pub best_hour: u32,
    /// Day of week, Monday = 0.
    pub best_weekday: u32,
    pub peak_periods: Vec<PeakPeriod>,
    pub predicted_daily_posts: f64,
    pub predicted_daily_engagement: f64,
    pub trend_confidence: f64,
    pub is_trending_up: bool,
    pub is_trending_down: bool,
}

impl TrendReport {
    /// The zeroed report used for empty windows and failed lookups.
    #[must_use]
    pub fn empty(source: &str, days: u32, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            source: source.to_string(),
            analysis_period_days: days,
            start,
            end,
            total_posts: 0,
            total_comments: 0,
            avg_posts_per_day: 0.0,
            avg_comments_per_day: 0.0,
            avg_score: 0.0,
            median_score: 0.0,
            score_stddev: 0.0,
            activity_pattern: ActivityPattern::Dormant,
            best_hour: crate::timing::DEFAULT_BEST_HOUR,
            best_weekday: 0,
            peak_periods: Vec::new(),
            predicted_daily_posts: 0.0,
            predicted_daily_engagement: 0.0,
            trend_confidence: 0.0,
            is_trending_up: false,
            is_trending_down: false,
        }
    }
}
