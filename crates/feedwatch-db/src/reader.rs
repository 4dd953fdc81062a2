//! Postgres-backed [`StateReader`].

use chrono::{DateTime, Utc};
use feedwatch_core::{PersistedComment, PersistedItem, StateReader, StoreError};
use sqlx::PgPool;

use crate::{comments, items, DbError};

/// Read-only view of recorded feed state in Postgres.
#[derive(Debug, Clone)]
pub struct PgStateReader {
    pool: PgPool,
}

impl PgStateReader {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl StateReader for PgStateReader {
    async fn get_item(&self, external_id: &str) -> Result<Option<PersistedItem>, StoreError> {
        items::get_item_by_external_id(&self.pool, external_id)
            .await
            .map(|row| row.map(PersistedItem::from))
            .map_err(store_error)
    }

    async fn get_item_by_id(&self, item_id: i64) -> Result<Option<PersistedItem>, StoreError> {
        items::get_item_by_id(&self.pool, item_id)
            .await
            .map(|row| row.map(PersistedItem::from))
            .map_err(store_error)
    }

    async fn get_comments(&self, item_id: i64) -> Result<Vec<PersistedComment>, StoreError> {
        comments::list_comments_for_item(&self.pool, item_id)
            .await
            .map(|rows| rows.into_iter().map(PersistedComment::from).collect())
            .map_err(store_error)
    }

    async fn get_items_in_range(
        &self,
        source: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PersistedItem>, StoreError> {
        items::list_items_in_range(&self.pool, source, start, end)
            .await
            .map(|rows| rows.into_iter().map(PersistedItem::from).collect())
            .map_err(store_error)
    }
}

/// Connection-level failures take the whole store down; anything else is one bad query.
pub(crate) fn store_error(err: DbError) -> StoreError {
    match err {
        DbError::Sqlx(
            e @ (sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)),
        ) => StoreError::Unavailable(e.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}
