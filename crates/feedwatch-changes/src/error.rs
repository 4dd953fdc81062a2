use feedwatch_core::StoreError;
use thiserror::Error;

/// A defect confined to one observed record.
///
/// Never escapes a public engine operation: the record is logged and skipped,
/// unless the wrapped [`StoreError`] reports the whole storage tier as down.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("observed item has no external id")]
    MissingExternalId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ItemError {
    /// `true` if the batch cannot continue because storage is unreachable.
    #[must_use]
    pub fn aborts_batch(&self) -> bool {
        matches!(self, ItemError::Store(e) if e.is_unavailable())
    }
}
