//! New and updated item detection for an observed batch.

use chrono::{DateTime, Utc};
use feedwatch_core::{ObservedItem, StateReader};

use crate::detector::{triage_item_error, ChangeDetector};
use crate::error::ItemError;
use crate::types::{ChangeDetectionResult, EngagementDelta, ItemUpdate, UpdateType};

impl<R: StateReader> ChangeDetector<R> {
    /// Observed items that have never been recorded and were created after
    /// `last_check_time`.
    ///
    /// Items without an id, or whose lookup fails, are logged and skipped. If
    /// storage is unavailable altogether the result is empty. Output keeps
    /// input order.
    pub async fn find_new(
        &self,
        observed: &[ObservedItem],
        last_check_time: DateTime<Utc>,
    ) -> Vec<ItemUpdate> {
        if observed.is_empty() {
            return Vec::new();
        }

        let detected_at = self.now();
        let mut new_items = Vec::new();

        for item in observed {
            match self.new_item_update(item, last_check_time, detected_at).await {
                Ok(Some(update)) => {
                    tracing::debug!(
                        item_id = %update.external_id,
                        source = %update.source,
                        "found new item"
                    );
                    new_items.push(update);
                }
                Ok(None) => {}
                Err(e) => {
                    if triage_item_error("find_new", item.external_id(), &e).is_break() {
                        return Vec::new();
                    }
                }
            }
        }

        tracing::info!(
            count = new_items.len(),
            since = %last_check_time,
            "new item detection finished"
        );
        new_items
    }

    async fn new_item_update(
        &self,
        item: &ObservedItem,
        last_check_time: DateTime<Utc>,
        detected_at: DateTime<Utc>,
    ) -> Result<Option<ItemUpdate>, ItemError> {
        let external_id = item.external_id().ok_or(ItemError::MissingExternalId)?;
        let existing = self.reader.get_item(external_id).await?;

        if existing.is_some() || item.created_at_or(detected_at) <= last_check_time {
            return Ok(None);
        }

        Ok(Some(ItemUpdate {
            item_id: None,
            external_id: external_id.to_string(),
            source: item.source.clone(),
            title: item.title.clone(),
            update_type: UpdateType::New,
            current_score: item.score,
            current_comments: item.comment_count,
            current_timestamp: detected_at,
            previous_score: None,
            previous_comments: None,
            previous_timestamp: None,
            engagement_delta: None,
        }))
    }

    /// Recorded items whose score or comment count moved.
    ///
    /// Unchanged and unrecorded items are omitted. Failure handling matches
    /// [`ChangeDetector::find_new`].
    pub async fn find_updated(&self, observed: &[ObservedItem]) -> Vec<ItemUpdate> {
        if observed.is_empty() {
            return Vec::new();
        }

        let detected_at = self.now();
        let mut updated_items = Vec::new();

        for item in observed {
            match self.updated_item(item, detected_at).await {
                Ok(Some(update)) => {
                    tracing::debug!(
                        item_id = %update.external_id,
                        update_type = %update.update_type,
                        score_delta = update.engagement_delta.as_ref().map(|d| d.score_delta),
                        comments_delta = update.engagement_delta.as_ref().map(|d| d.comments_delta),
                        "found updated item"
                    );
                    updated_items.push(update);
                }
                Ok(None) => {}
                Err(e) => {
                    if triage_item_error("find_updated", item.external_id(), &e).is_break() {
                        return Vec::new();
                    }
                }
            }
        }

        tracing::info!(
            count = updated_items.len(),
            "updated item detection finished"
        );
        updated_items
    }

    async fn updated_item(
        &self,
        item: &ObservedItem,
        detected_at: DateTime<Utc>,
    ) -> Result<Option<ItemUpdate>, ItemError> {
        let external_id = item.external_id().ok_or(ItemError::MissingExternalId)?;
        let Some(existing) = self.reader.get_item(external_id).await? else {
            return Ok(None);
        };

        let Some(update_type) = UpdateType::from_changes(
            item.score != existing.score,
            item.comment_count != existing.comment_count,
        ) else {
            return Ok(None);
        };

        let delta = EngagementDelta::between(
            external_id,
            &existing,
            item.score,
            item.comment_count,
            detected_at,
        );

        Ok(Some(ItemUpdate {
            item_id: Some(existing.id),
            external_id: external_id.to_string(),
            source: existing.source,
            title: existing.title,
            update_type,
            current_score: item.score,
            current_comments: item.comment_count,
            current_timestamp: detected_at,
            previous_score: Some(existing.score),
            previous_comments: Some(existing.comment_count),
            previous_timestamp: Some(existing.last_updated),
            engagement_delta: Some(delta),
        }))
    }

    /// Run new and updated detection over the same batch and summarize.
    pub async fn detect_all_changes(
        &self,
        source: &str,
        observed: &[ObservedItem],
        last_check_time: DateTime<Utc>,
    ) -> ChangeDetectionResult {
        tracing::info!(source, observed = observed.len(), "starting change detection");

        let new_items = self.find_new(observed, last_check_time).await;
        let updated_items = self.find_updated(observed).await;
        let result =
            ChangeDetectionResult::from_updates(source, self.now(), new_items, updated_items);

        tracing::info!(
            source,
            new = result.total_new,
            updated = result.total_updated,
            significant = result.significant_changes,
            trending_up = result.trending_up,
            trending_down = result.trending_down,
            "change detection finished"
        );
        result
    }
}
