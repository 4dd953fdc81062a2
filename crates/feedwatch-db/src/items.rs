//! Database reads for the `items` table.

use chrono::{DateTime, Utc};
use feedwatch_core::PersistedItem;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub id: i64,
    pub external_id: String,
    pub source: String,
    pub title: String,
    pub author: Option<String>,
    pub score: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<ItemRow> for PersistedItem {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            external_id: row.external_id,
            source: row.source,
            title: row.title,
            author: row.author,
            score: row.score,
            comment_count: row.comment_count,
            created_at: row.created_at,
            last_updated: row.last_updated,
        }
    }
}

/// Fetch an item by its external (platform) id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_item_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<ItemRow>, DbError> {
    let row = sqlx::query_as::<_, ItemRow>(
        "SELECT id, external_id, source, title, author, score, comment_count, \
                created_at, last_updated \
         FROM items \
         WHERE external_id = $1",
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetch an item by its internal id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_item_by_id(pool: &PgPool, id: i64) -> Result<Option<ItemRow>, DbError> {
    let row = sqlx::query_as::<_, ItemRow>(
        "SELECT id, external_id, source, title, author, score, comment_count, \
                created_at, last_updated \
         FROM items \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List items for a source created within `[start, end]`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_items_in_range(
    pool: &PgPool,
    source: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ItemRow>, DbError> {
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, external_id, source, title, author, score, comment_count, \
                created_at, last_updated \
         FROM items \
         WHERE source = $1 AND created_at >= $2 AND created_at <= $3 \
         ORDER BY created_at ASC, id ASC",
    )
    .bind(source)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
