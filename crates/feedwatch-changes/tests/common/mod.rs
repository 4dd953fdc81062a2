//! In-memory state reader shared by the engine integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;

use chrono::{DateTime, Duration, TimeZone, Utc};
use feedwatch_changes::ChangeDetector;
use feedwatch_core::{
    ObservedComment, ObservedItem, PersistedComment, PersistedItem, StateReader, StoreError,
};

/// Fixed clock for every scenario: midday, so day-bucketing is unambiguous.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
}

#[derive(Debug, Default, Clone)]
pub struct MemoryReader {
    items: Vec<PersistedItem>,
    comments: HashMap<i64, Vec<PersistedComment>>,
    failing_ids: HashSet<String>,
    unavailable: bool,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: PersistedItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = PersistedItem>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn with_comment(mut self, comment: PersistedComment) -> Self {
        self.comments.entry(comment.item_id).or_default().push(comment);
        self
    }

    /// Lookups for this external id fail with a query error.
    pub fn failing_on(mut self, external_id: &str) -> Self {
        self.failing_ids.insert(external_id.to_string());
        self
    }

    /// Every lookup reports the storage tier as down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl StateReader for MemoryReader {
    fn get_item(
        &self,
        external_id: &str,
    ) -> impl Future<Output = Result<Option<PersistedItem>, StoreError>> + Send {
        let result = self.check_available().and_then(|()| {
            if self.failing_ids.contains(external_id) {
                return Err(StoreError::Query(format!("lookup failed for {external_id}")));
            }
            Ok(self
                .items
                .iter()
                .find(|i| i.external_id == external_id)
                .cloned())
        });
        async move { result }
    }

    fn get_item_by_id(
        &self,
        item_id: i64,
    ) -> impl Future<Output = Result<Option<PersistedItem>, StoreError>> + Send {
        let result = self
            .check_available()
            .map(|()| self.items.iter().find(|i| i.id == item_id).cloned());
        async move { result }
    }

    fn get_comments(
        &self,
        item_id: i64,
    ) -> impl Future<Output = Result<Vec<PersistedComment>, StoreError>> + Send {
        let result = self
            .check_available()
            .map(|()| self.comments.get(&item_id).cloned().unwrap_or_default());
        async move { result }
    }

    fn get_items_in_range(
        &self,
        source: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<PersistedItem>, StoreError>> + Send {
        let result = self.check_available().map(|()| {
            self.items
                .iter()
                .filter(|i| i.source == source && i.created_at >= start && i.created_at <= end)
                .cloned()
                .collect()
        });
        async move { result }
    }
}

pub fn detector(reader: MemoryReader) -> ChangeDetector<MemoryReader> {
    ChangeDetector::new(reader).with_fixed_now(now())
}

pub fn persisted(id: i64, external_id: &str, score: i64, comments: i64) -> PersistedItem {
    let at = now() - Duration::hours(3);
    PersistedItem {
        id,
        external_id: external_id.to_string(),
        source: "rust".to_string(),
        title: format!("Item {external_id}"),
        author: Some("ferris".to_string()),
        score,
        comment_count: comments,
        created_at: at,
        last_updated: at,
    }
}

/// A recorded item created at `now() - days_ago` days, shifted by `hour_offset` hours.
pub fn posted(
    id: i64,
    source: &str,
    days_ago: i64,
    hour_offset: i64,
    score: i64,
    comments: i64,
) -> PersistedItem {
    let at = now() - Duration::days(days_ago) + Duration::hours(hour_offset);
    PersistedItem {
        id,
        external_id: format!("t{id}"),
        source: source.to_string(),
        title: String::new(),
        author: None,
        score,
        comment_count: comments,
        created_at: at,
        last_updated: at,
    }
}

pub fn observed(external_id: &str, score: i64, comments: i64) -> ObservedItem {
    ObservedItem {
        item_id: Some(external_id.to_string()),
        source: "rust".to_string(),
        title: format!("Item {external_id}"),
        score,
        comment_count: comments,
        created_at: Some(now() - Duration::hours(1)),
        ..ObservedItem::default()
    }
}

pub fn recorded_comment(
    item_id: i64,
    comment_id: &str,
    parent_id: &str,
    score: i64,
) -> PersistedComment {
    PersistedComment {
        id: 0,
        item_id,
        comment_id: comment_id.to_string(),
        parent_id: Some(parent_id.to_string()),
        author: Some("ferris".to_string()),
        body: format!("comment {comment_id}"),
        score,
        created_at: now() - Duration::hours(2),
        last_updated: now() - Duration::hours(2),
    }
}

pub fn observed_comment(comment_id: &str, parent_id: &str, score: i64) -> ObservedComment {
    ObservedComment {
        comment_id: Some(comment_id.to_string()),
        parent_id: Some(parent_id.to_string()),
        body: format!("comment {comment_id}"),
        score,
        ..ObservedComment::default()
    }
}
