//! Postgres storage for mentions: pool connection, develop-gated
//! schema migration, and the deduplicating MentionSink boundary.

pub mod client;
pub mod migrate;
pub mod sink;

pub use client::connect;
pub use migrate::migrate;
pub use sink::{InsertOutcome, MemorySink, MentionSink, PgMentionSink};
