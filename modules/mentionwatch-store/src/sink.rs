//! MentionSink implementations.
//!
//! The sink is the dedup boundary: append-only by identity, no update
//! or delete surface. `insert_if_absent` is a single atomic statement
//! so the exists/insert pair stays correct if concurrent writers are
//! ever added.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use mentionwatch_common::MentionRecord;

/// Outcome of a conditional insert. `AlreadyExists` is expected and
/// non-error — most polled items have been seen before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

#[async_trait]
pub trait MentionSink: Send + Sync {
    /// Point lookup by natural key. The hot path — called once per
    /// surviving item every cycle.
    async fn exists(&self, post_id: &str) -> Result<bool>;

    /// Insert unless a record with the same natural key exists.
    async fn insert_if_absent(&self, record: &MentionRecord) -> Result<InsertOutcome>;
}

// ---------------------------------------------------------------------------
// PgMentionSink (production — postgres)
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgMentionSink {
    pool: PgPool,
}

impl PgMentionSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MentionSink for PgMentionSink {
    async fn exists(&self, post_id: &str) -> Result<bool> {
        let row = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS (SELECT 1 FROM mentions WHERE post_id = $1)",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn insert_if_absent(&self, record: &MentionRecord) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO mentions (id, post_id, author_id, author_handle, posted_at, body)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (post_id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(&record.post_id)
        .bind(&record.author_id)
        .bind(&record.author_handle)
        .bind(record.posted_at)
        .bind(&record.body)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!(post_id = record.post_id.as_str(), "Mention stored");
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyExists)
        }
    }
}

// ---------------------------------------------------------------------------
// MemorySink (tests — no database required)
// ---------------------------------------------------------------------------

/// In-memory sink for testing. Thread-safe, keyed by post_id like the
/// real table.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<HashMap<String, MentionRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all stored records (for test assertions).
    pub fn records(&self) -> Vec<MentionRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MentionSink for MemorySink {
    async fn exists(&self, post_id: &str) -> Result<bool> {
        Ok(self.records.lock().unwrap().contains_key(post_id))
    }

    async fn insert_if_absent(&self, record: &MentionRecord) -> Result<InsertOutcome> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.post_id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        records.insert(record.post_id.clone(), record.clone());
        Ok(InsertOutcome::Inserted)
    }
}

// ---------------------------------------------------------------------------
// Arc<S> blanket — lets tests share the sink for assertions
// ---------------------------------------------------------------------------

#[async_trait]
impl<S: MentionSink + ?Sized> MentionSink for Arc<S> {
    async fn exists(&self, post_id: &str) -> Result<bool> {
        (**self).exists(post_id).await
    }

    async fn insert_if_absent(&self, record: &MentionRecord) -> Result<InsertOutcome> {
        (**self).insert_if_absent(record).await
    }
}
