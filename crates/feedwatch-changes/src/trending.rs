//! Ranking of recorded items by how quickly they are gaining score.

use std::cmp::Ordering;

use feedwatch_core::{ObservedItem, StateReader};

use crate::detector::{triage_item_error, ChangeDetector};
use crate::error::ItemError;
use crate::types::{EngagementDelta, TrendingItem, SIGNIFICANT_SCORE_DELTA};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendingCriteria {
    pub min_score_delta: i64,
    pub min_time_span_hours: f64,
    pub limit: usize,
}

impl Default for TrendingCriteria {
    fn default() -> Self {
        Self {
            min_score_delta: SIGNIFICANT_SCORE_DELTA,
            min_time_span_hours: 1.0,
            limit: 10,
        }
    }
}

impl TrendingCriteria {
    fn admits(&self, delta: &EngagementDelta) -> bool {
        delta.is_trending_up
            && delta.score_delta.abs() >= self.min_score_delta
            && delta.time_span_hours >= self.min_time_span_hours
    }
}

impl<R: StateReader> ChangeDetector<R> {
    /// Recorded items in `observed` that are climbing, fastest first.
    pub async fn trending_items(
        &self,
        observed: &[ObservedItem],
        criteria: TrendingCriteria,
    ) -> Vec<TrendingItem> {
        let observed_at = self.now();
        let mut trending = Vec::new();

        for item in observed {
            let lookup = match item.external_id() {
                Some(id) => self.reader.get_item(id).await.map_err(ItemError::from),
                None => Err(ItemError::MissingExternalId),
            };
            let existing = match lookup {
                Ok(Some(existing)) => existing,
                Ok(None) => continue,
                Err(e) => {
                    if triage_item_error("trending_items", item.external_id(), &e).is_break() {
                        return Vec::new();
                    }
                    continue;
                }
            };

            let delta = EngagementDelta::between(
                &existing.external_id,
                &existing,
                item.score,
                item.comment_count,
                observed_at,
            );
            if criteria.admits(&delta) {
                trending.push(TrendingItem {
                    item: existing,
                    delta,
                });
            }
        }

        trending.sort_by(|a, b| {
            b.delta
                .engagement_rate
                .partial_cmp(&a.delta.engagement_rate)
                .unwrap_or(Ordering::Equal)
        });
        trending.truncate(criteria.limit);

        tracing::debug!(count = trending.len(), "ranked trending items");
        trending
    }
}
