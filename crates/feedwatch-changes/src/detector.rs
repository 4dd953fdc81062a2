use std::ops::ControlFlow;

use chrono::{DateTime, Duration, Utc};
use feedwatch_core::{PersistedItem, StateReader, StoreError};

use crate::error::ItemError;

/// Change detection and trend analytics over a storage reader.
///
/// Holds no state besides the reader, so one detector per storage session can
/// serve concurrent callers. All loops run sequentially; nothing is spawned.
pub struct ChangeDetector<R> {
    pub(crate) reader: R,
    fixed_now: Option<DateTime<Utc>>,
}

impl<R: StateReader> ChangeDetector<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            fixed_now: None,
        }
    }

    /// Pin the clock used for detection timestamps and analysis windows.
    #[must_use]
    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Items for `source` created in the `days` leading up to now.
    pub(crate) async fn items_in_window(
        &self,
        source: &str,
        days: i64,
    ) -> Result<Vec<PersistedItem>, StoreError> {
        let end = self.now();
        let start = end - Duration::days(days);
        self.reader.get_items_in_range(source, start, end).await
    }
}

/// Log a per-item failure and decide whether the batch can go on.
pub(crate) fn triage_item_error(
    operation: &str,
    item_id: Option<&str>,
    err: &ItemError,
) -> ControlFlow<()> {
    match err {
        ItemError::MissingExternalId => {
            tracing::warn!(operation, "observed item missing external id, skipping");
            ControlFlow::Continue(())
        }
        ItemError::Store(e) if err.aborts_batch() => {
            tracing::error!(operation, item_id, error = %e, "storage unavailable, aborting batch");
            ControlFlow::Break(())
        }
        ItemError::Store(e) => {
            tracing::error!(operation, item_id, error = %e, "lookup failed, skipping item");
            ControlFlow::Continue(())
        }
    }
}
