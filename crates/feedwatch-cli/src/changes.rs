//! Batch diffing command handlers.

use std::path::Path;

use chrono::{DateTime, Utc};
use feedwatch_changes::{ChangeDetector, TrendingCriteria};
use feedwatch_core::{ObservedComment, ObservedItem};
use feedwatch_db::PgStateReader;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read a JSON array of observed records from `path`.
///
/// Elements that do not decode as `T` are logged and skipped so one malformed
/// record does not sink the rest of the batch.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array.
pub(crate) fn read_batch<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read batch file {}: {e}", path.display()))?;
    let elements: Vec<serde_json::Value> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse batch file {}: {e}", path.display()))?;

    let total = elements.len();
    let records: Vec<T> = elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| match serde_json::from_value(element) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed batch record");
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(
            batch = %path.display(),
            skipped = total - records.len(),
            total,
            "batch contained malformed records"
        );
    }
    Ok(records)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Stamp `source` onto items whose upstream record left it blank.
fn with_source(mut items: Vec<ObservedItem>, source: &str) -> Vec<ObservedItem> {
    for item in items.iter_mut().filter(|i| i.source.is_empty()) {
        item.source = source.to_string();
    }
    items
}

fn detector(pool: &sqlx::PgPool) -> ChangeDetector<PgStateReader> {
    ChangeDetector::new(PgStateReader::new(pool.clone()))
}

/// Diff an observed item batch and print the change summary.
///
/// # Errors
///
/// Returns an error if the batch file cannot be loaded or the output cannot be serialized.
pub(crate) async fn run_check(
    pool: &sqlx::PgPool,
    source: &str,
    batch: &Path,
    since: DateTime<Utc>,
) -> anyhow::Result<()> {
    let observed = with_source(read_batch::<ObservedItem>(batch)?, source);
    tracing::info!(source, items = observed.len(), %since, "checking batch");

    let result = detector(pool)
        .detect_all_changes(source, &observed, since)
        .await;
    print_json(&result)
}

#[derive(Serialize)]
struct CommentReport {
    metrics: feedwatch_changes::CommentMetrics,
    tree: feedwatch_changes::CommentTreeShape,
}

/// Diff observed comments for one item and print metrics plus thread shape.
///
/// # Errors
///
/// Returns an error if the batch file cannot be loaded or the output cannot be serialized.
pub(crate) async fn run_comments(
    pool: &sqlx::PgPool,
    item_id: i64,
    batch: &Path,
) -> anyhow::Result<()> {
    let observed = read_batch::<ObservedComment>(batch)?;
    let detector = detector(pool);

    let report = CommentReport {
        metrics: detector.comment_metrics(item_id, &observed).await,
        tree: detector.tree_shape(item_id).await,
    };
    print_json(&report)
}

/// Print the fastest-climbing recorded items from an observed batch.
///
/// # Errors
///
/// Returns an error if the batch file cannot be loaded or the output cannot be serialized.
pub(crate) async fn run_trending(
    pool: &sqlx::PgPool,
    source: &str,
    batch: &Path,
    limit: usize,
) -> anyhow::Result<()> {
    let observed = with_source(read_batch::<ObservedItem>(batch)?, source);
    let criteria = TrendingCriteria {
        limit,
        ..TrendingCriteria::default()
    };

    let trending = detector(pool).trending_items(&observed, criteria).await;
    if trending.is_empty() {
        tracing::info!(source, "no trending items in batch");
    }
    print_json(&trending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_batch(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("feedwatch-{}-{name}", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn read_batch_parses_upstream_field_names() {
        let path = temp_batch(
            "items.json",
            r#"[{"post_id": "p1", "subreddit": "rust", "score": 5, "num_comments": 2,
                 "created_utc": 1741600000}]"#,
        );
        let items: Vec<ObservedItem> = read_batch(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].external_id(), Some("p1"));
        assert_eq!(items[0].comment_count, 2);
        assert!(items[0].created_at.is_some());
    }

    #[test]
    fn read_batch_rejects_non_arrays() {
        let path = temp_batch("bad.json", r#"{"post_id": "p1"}"#);
        let result: anyhow::Result<Vec<ObservedItem>> = read_batch(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn read_batch_skips_malformed_records() {
        let path = temp_batch(
            "mixed.json",
            r#"[{"post_id": "p1", "score": 3},
                {"post_id": "p2", "created_utc": "yesterday"},
                {"post_id": "p3", "score": "lots"}]"#,
        );
        let items: Vec<ObservedItem> = read_batch(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].external_id(), Some("p1"));
        assert_eq!(items[0].score, 3);
    }

    #[test]
    fn missing_source_is_stamped() {
        let items = vec![
            ObservedItem::default(),
            ObservedItem {
                source: "golang".to_string(),
                ..ObservedItem::default()
            },
        ];
        let stamped = with_source(items, "rust");
        assert_eq!(stamped[0].source, "rust");
        assert_eq!(stamped[1].source, "golang");
    }
}
