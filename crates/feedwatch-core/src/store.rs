//! Read-only contract for previously recorded feed state.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::records::{PersistedComment, PersistedItem};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The storage tier as a whole is unreachable (pool closed, connection lost).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A single query failed; other lookups may still succeed.
    #[error("storage query failed: {0}")]
    Query(String),
}

impl StoreError {
    /// `true` when the failure affects every subsequent lookup, not just this one.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Previously recorded item and comment state.
///
/// Implementations must not mutate anything; the change engine only reads.
/// A missing record is `Ok(None)` / an empty `Vec`, never an error.
pub trait StateReader {
    /// Look up an item by its external (platform) id.
    fn get_item(
        &self,
        external_id: &str,
    ) -> impl Future<Output = Result<Option<PersistedItem>, StoreError>> + Send;

    /// Look up an item by its internal storage id.
    fn get_item_by_id(
        &self,
        item_id: i64,
    ) -> impl Future<Output = Result<Option<PersistedItem>, StoreError>> + Send;

    /// All recorded comments for an item, keyed by the item's internal id.
    fn get_comments(
        &self,
        item_id: i64,
    ) -> impl Future<Output = Result<Vec<PersistedComment>, StoreError>> + Send;

    /// Items for `source` created within `[start, end]`.
    fn get_items_in_range(
        &self,
        source: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<PersistedItem>, StoreError>> + Send;
}
