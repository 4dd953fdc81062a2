//! Change detection and trend analytics for monitored feeds.
//!
//! Diffs a freshly observed batch of items and comments against previously
//! recorded state, quantifies engagement movement, and summarizes a source's
//! recent activity with a short-term forecast. Reads state through
//! [`feedwatch_core::StateReader`]; never writes.

pub mod activity;
pub mod error;
pub mod forecast;
pub mod timing;
pub mod types;

mod comments;
mod delta;
mod detector;
mod posts;
mod stats;
mod trending;
mod trends;

pub use detector::ChangeDetector;
pub use error::ItemError;
pub use trending::TrendingCriteria;
pub use types::{
    ActivityPattern, ChangeDetectionResult, CommentMetrics, CommentTreeShape, EngagementDelta,
    Forecast, ItemUpdate, PeakPeriod, ScoreChangeDistribution, TopNewComment, TrendReport,
    TrendingItem, UpdateType, UpdatedComment, MIN_TIME_SPAN_HOURS, SIGNIFICANT_SCORE_DELTA,
};
