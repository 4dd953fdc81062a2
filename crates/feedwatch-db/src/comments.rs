//! Database reads for the `comments` table.

use chrono::{DateTime, Utc};
use feedwatch_core::PersistedComment;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `comments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub item_id: i64,
    pub comment_id: String,
    pub parent_id: Option<String>,
    pub author: Option<String>,
    pub body: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<CommentRow> for PersistedComment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            item_id: row.item_id,
            comment_id: row.comment_id,
            parent_id: row.parent_id,
            author: row.author,
            body: row.body,
            score: row.score,
            created_at: row.created_at,
            last_updated: row.last_updated,
        }
    }
}

/// All comments recorded for an item, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_comments_for_item(
    pool: &PgPool,
    item_id: i64,
) -> Result<Vec<CommentRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, item_id, comment_id, parent_id, author, body, score, \
                created_at, last_updated \
         FROM comments \
         WHERE item_id = $1 \
         ORDER BY id ASC",
    )
    .bind(item_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
