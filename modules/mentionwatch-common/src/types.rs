use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The search the poller runs every cycle. Built once from config,
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    /// Upper bound on items per poll cycle.
    pub page_size: u32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, page_size: u32) -> Self {
        Self {
            query: query.into(),
            page_size,
        }
    }
}

/// A persisted mention. At most one exists per `post_id` — that
/// uniqueness is the central invariant of the whole system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionRecord {
    pub id: Uuid,
    /// Natural key: the platform-assigned post identifier.
    pub post_id: String,
    pub author_id: String,
    pub author_handle: String,
    pub posted_at: DateTime<Utc>,
    pub body: String,
}

impl MentionRecord {
    /// Build a record from raw search-result fields. `timestamp` is
    /// unix seconds as the provider reports it; out-of-range values
    /// clamp to the epoch rather than failing the whole item.
    pub fn from_raw(
        post_id: impl Into<String>,
        author_id: impl Into<String>,
        author_handle: impl Into<String>,
        timestamp: i64,
        body: impl Into<String>,
    ) -> Self {
        let posted_at = Utc
            .timestamp_opt(timestamp, 0)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH);
        Self {
            id: Uuid::new_v4(),
            post_id: post_id.into(),
            author_id: author_id.into(),
            author_handle: author_handle.into(),
            posted_at,
            body: body.into(),
        }
    }
}
