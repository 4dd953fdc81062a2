//! Observed (freshly fetched) and persisted (previously recorded) feed records.
//!
//! Observed records arrive from the fetch collaborator and may be incomplete:
//! numeric fields default to `0`, text fields to empty, and optional fields to
//! `None`. Persisted records come from the storage collaborator and are complete.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// A post as seen in the current fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservedItem {
    /// External (platform) id. Items without one are skipped by the diff engines.
    #[serde(default, alias = "post_id")]
    pub item_id: Option<String>,
    #[serde(default, alias = "subreddit")]
    pub source: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default, alias = "num_comments")]
    pub comment_count: i64,
    #[serde(
        default,
        alias = "created_utc",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl ObservedItem {
    /// Creation time, or `fallback` when the upstream record omitted it.
    #[must_use]
    pub fn created_at_or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.created_at.unwrap_or(fallback)
    }

    /// The external id, treating an empty string as missing.
    #[must_use]
    pub fn external_id(&self) -> Option<&str> {
        self.item_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A comment as seen in the current fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservedComment {
    #[serde(default)]
    pub comment_id: Option<String>,
    /// External id of the parent: the item itself for top-level comments.
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub score: i64,
    #[serde(
        default,
        alias = "created_utc",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl ObservedComment {
    /// The comment id, treating an empty string as missing.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.comment_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Last recorded snapshot of an item, owned by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedItem {
    /// Internal storage id.
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

/// Last recorded snapshot of a comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedComment {
    pub id: i64,
    /// Internal id of the owning item.
    pub item_id: i64,
    pub comment_id: String,
    pub parent_id: Option<String>,
    pub author: Option<String>,
    pub body: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Epoch(f64),
    Text(String),
}

/// Parse a timestamp string into UTC.
///
/// Accepts RFC 3339 with an offset, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` /
/// `YYYY-MM-DD HH:MM:SS[.f]` value which is taken to already be UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Convert a (possibly fractional) Unix epoch in seconds into UTC.
#[must_use]
pub fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nanos = ((secs - whole) * 1e9) as u32;
    #[allow(clippy::cast_possible_truncation)]
    let whole = whole as i64;
    DateTime::from_timestamp(whole, nanos)
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimestamp::Epoch(secs)) => from_epoch_seconds(secs)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("epoch out of range: {secs}"))),
        Some(RawTimestamp::Text(text)) => parse_timestamp(&text)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {text}"))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn observed_item_defaults_missing_fields() {
        let item: ObservedItem = serde_json::from_str(r#"{"post_id": "p1"}"#).unwrap();
        assert_eq!(item.external_id(), Some("p1"));
        assert_eq!(item.score, 0);
        assert_eq!(item.comment_count, 0);
        assert!(item.author.is_none());
        assert!(item.created_at.is_none());
        assert_eq!(item.title, "");
    }

    #[test]
    fn observed_item_accepts_upstream_aliases() {
        let item: ObservedItem = serde_json::from_str(
            r#"{"post_id": "abc", "subreddit": "rust", "num_comments": 12, "score": 40, "created_utc": 1700000000}"#,
        )
        .unwrap();
        assert_eq!(item.source, "rust");
        assert_eq!(item.comment_count, 12);
        assert_eq!(
            item.created_at,
            Some(Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap())
        );
    }

    #[test]
    fn empty_item_id_counts_as_missing() {
        let item = ObservedItem {
            item_id: Some(String::new()),
            ..ObservedItem::default()
        };
        assert!(item.external_id().is_none());
    }

    #[test]
    fn naive_timestamp_is_taken_as_utc() {
        let parsed = parse_timestamp("2024-05-01T10:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap());

        let spaced = parse_timestamp("2024-05-01 10:30:00.250").unwrap();
        assert_eq!(spaced.timestamp(), parsed.timestamp());
    }

    #[test]
    fn offset_timestamp_is_normalized_to_utc() {
        let parsed = parse_timestamp("2024-05-01T12:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn fractional_epoch_keeps_subsecond_precision() {
        let parsed = from_epoch_seconds(1_700_000_000.5).unwrap();
        assert_eq!(parsed.timestamp(), 1_700_000_000);
        assert_eq!(parsed.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn garbage_timestamp_fails_deserialization() {
        let result: Result<ObservedComment, _> =
            serde_json::from_str(r#"{"comment_id": "c1", "created_at": "yesterday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn observed_comment_null_timestamp_is_none() {
        let comment: ObservedComment =
            serde_json::from_str(r#"{"comment_id": "c1", "created_at": null}"#).unwrap();
        assert!(comment.created_at.is_none());
        assert_eq!(comment.id(), Some("c1"));
    }
}
