//! Comment diffing and comment-tree shape analysis.

use std::collections::{HashMap, HashSet, VecDeque};

use feedwatch_core::{ObservedComment, PersistedComment, PersistedItem, StateReader, StoreError};

use crate::detector::ChangeDetector;
use crate::types::{
    CommentMetrics, CommentTreeShape, ScoreChangeDistribution, TopNewComment, UpdatedComment,
};

const BODY_PREVIEW_CHARS: usize = 100;

/// A recorded item together with all of its recorded comments.
struct CommentBaseline {
    item: PersistedItem,
    comments: Vec<PersistedComment>,
}

impl<R: StateReader> ChangeDetector<R> {
    async fn comment_baseline(&self, item_id: i64) -> Result<Option<CommentBaseline>, StoreError> {
        let Some(item) = self.reader.get_item_by_id(item_id).await? else {
            return Ok(None);
        };
        let comments = self.reader.get_comments(item_id).await?;
        Ok(Some(CommentBaseline { item, comments }))
    }

    /// Load the baseline, collapsing "no such item" and storage failures to `None`.
    async fn comment_baseline_or_log(&self, item_id: i64, operation: &str) -> Option<CommentBaseline> {
        match self.comment_baseline(item_id).await {
            Ok(Some(baseline)) => Some(baseline),
            Ok(None) => {
                tracing::debug!(item_id, operation, "item not recorded, nothing to compare");
                None
            }
            Err(e) => {
                tracing::error!(item_id, operation, error = %e, "failed to load recorded comments");
                None
            }
        }
    }

    /// Observed comments not yet recorded for the item.
    pub async fn find_new_comments(
        &self,
        item_id: i64,
        observed: &[ObservedComment],
    ) -> Vec<ObservedComment> {
        if observed.is_empty() {
            return Vec::new();
        }
        let Some(baseline) = self.comment_baseline_or_log(item_id, "find_new_comments").await
        else {
            return Vec::new();
        };

        let new_comments = new_comments_in(&baseline.comments, observed);
        tracing::info!(item_id, count = new_comments.len(), "new comment detection finished");
        new_comments
    }

    /// Recorded comments whose score moved, annotated with the movement.
    pub async fn find_updated_comments(
        &self,
        item_id: i64,
        observed: &[ObservedComment],
    ) -> Vec<UpdatedComment> {
        if observed.is_empty() {
            return Vec::new();
        }
        let Some(baseline) = self
            .comment_baseline_or_log(item_id, "find_updated_comments")
            .await
        else {
            return Vec::new();
        };

        let updated = updated_comments_in(&baseline.comments, observed);
        tracing::info!(item_id, count = updated.len(), "updated comment detection finished");
        updated
    }

    /// Shape of the recorded comment tree under an item.
    pub async fn tree_shape(&self, item_id: i64) -> CommentTreeShape {
        match self.comment_baseline_or_log(item_id, "tree_shape").await {
            Some(baseline) => {
                let shape = tree_shape_of(&baseline.item, &baseline.comments);
                tracing::debug!(
                    item_id,
                    total = shape.total_comments,
                    top_level = shape.top_level_count,
                    replies = shape.total_replies,
                    max_depth = shape.max_depth,
                    "comment tree analyzed"
                );
                shape
            }
            None => CommentTreeShape::empty(item_id),
        }
    }

    /// New-comment and score-movement summary for one item.
    pub async fn comment_metrics(&self, item_id: i64, observed: &[ObservedComment]) -> CommentMetrics {
        match self.comment_baseline_or_log(item_id, "comment_metrics").await {
            Some(baseline) => metrics_of(item_id, &baseline.comments, observed),
            None => CommentMetrics::empty(item_id),
        }
    }
}

fn new_comments_in(recorded: &[PersistedComment], observed: &[ObservedComment]) -> Vec<ObservedComment> {
    let known: HashSet<&str> = recorded.iter().map(|c| c.comment_id.as_str()).collect();

    observed
        .iter()
        .filter(|comment| match comment.id() {
            Some(id) => !known.contains(id),
            None => {
                tracing::warn!("observed comment missing comment id, skipping");
                false
            }
        })
        .cloned()
        .collect()
}

fn updated_comments_in(
    recorded: &[PersistedComment],
    observed: &[ObservedComment],
) -> Vec<UpdatedComment> {
    let by_id: HashMap<&str, &PersistedComment> = recorded
        .iter()
        .map(|c| (c.comment_id.as_str(), c))
        .collect();

    observed
        .iter()
        .filter_map(|comment| {
            let previous = by_id.get(comment.id()?)?;
            let score_delta = comment.score - previous.score;
            (score_delta != 0).then(|| UpdatedComment {
                comment: comment.clone(),
                score_delta,
                previous_score: previous.score,
                current_score: comment.score,
                last_updated: previous.last_updated,
            })
        })
        .collect()
}

/// Breadth-first walk from the item's external id. Item = depth 1.
fn tree_shape_of(item: &PersistedItem, comments: &[PersistedComment]) -> CommentTreeShape {
    if comments.is_empty() {
        return CommentTreeShape::empty(item.id);
    }

    let root = item.external_id.as_str();
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for comment in comments {
        if let Some(parent) = comment.parent_id.as_deref() {
            children
                .entry(parent)
                .or_default()
                .push(comment.comment_id.as_str());
        }
    }

    let top_level_count = children.get(root).map_or(0, Vec::len);

    let mut max_depth = 1;
    let mut visited: HashSet<&str> = HashSet::from([root]);
    let mut queue: VecDeque<(&str, usize)> = children
        .get(root)
        .into_iter()
        .flatten()
        .map(|id| (*id, 2))
        .collect();

    while let Some((id, depth)) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        max_depth = max_depth.max(depth);
        if let Some(kids) = children.get(id) {
            queue.extend(kids.iter().map(|kid| (*kid, depth + 1)));
        }
    }

    CommentTreeShape {
        item_id: item.id,
        total_comments: comments.len(),
        top_level_count,
        total_replies: comments.len() - top_level_count,
        max_depth,
    }
}

fn metrics_of(
    item_id: i64,
    recorded: &[PersistedComment],
    observed: &[ObservedComment],
) -> CommentMetrics {
    let new_comments = new_comments_in(recorded, observed);
    let updated = updated_comments_in(recorded, observed);

    // First occurrence wins on equal scores.
    let top_new_comment = new_comments
        .iter()
        .reduce(|best, c| if c.score > best.score { c } else { best })
        .map(|c| TopNewComment {
            comment_id: c.id().unwrap_or_default().to_string(),
            author: c.author.clone(),
            score: c.score,
            body_preview: body_preview(&c.body),
        });

    let mut distribution = ScoreChangeDistribution::default();
    for comment in &updated {
        if comment.score_delta > 0 {
            distribution.positive += 1;
        } else {
            distribution.negative += 1;
        }
        distribution.total_score_change += comment.score_delta;
    }

    let recorded_ids: HashSet<&str> = recorded.iter().map(|c| c.comment_id.as_str()).collect();
    let updated_ids: HashSet<&str> = updated.iter().filter_map(|c| c.comment.id()).collect();
    distribution.unchanged = observed
        .iter()
        .filter_map(ObservedComment::id)
        .collect::<HashSet<&str>>()
        .into_iter()
        .filter(|id| recorded_ids.contains(id) && !updated_ids.contains(id))
        .count();

    let avg_score_change = if updated.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let avg = distribution.total_score_change as f64 / updated.len() as f64;
        avg
    };

    CommentMetrics {
        item_id,
        new_count: new_comments.len(),
        updated_count: updated.len(),
        top_new_comment,
        score_change_distribution: distribution,
        avg_score_change,
    }
}

fn body_preview(body: &str) -> String {
    if body.chars().count() > BODY_PREVIEW_CHARS {
        let head: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
#[path = "comments_test.rs"]
mod tests;
