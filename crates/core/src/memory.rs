//! Memory boundary — the long-term store for past conversation messages.
//!
//! The agent spills trimmed chat history into this store and recalls
//! relevant records by keyword search when the capability selector decides
//! the turn needs them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::MemoryError;

/// A stored memory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique ID for this record.
    pub id: String,

    /// The stored content (a formatted chat message).
    pub content: String,

    /// When this record was created.
    pub created_at: DateTime<Utc>,

    /// Relevance score (set by search operations).
    #[serde(default)]
    pub score: f32,
}

/// The long-term memory store.
///
/// Implementations: file-backed JSONL, in-memory (tests/ephemeral), no-op.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "file", "in_memory", "none").
    fn name(&self) -> &str;

    /// Store a piece of content. Returns the new record's id.
    async fn store(&self, content: &str) -> std::result::Result<String, MemoryError>;

    /// Search records by relevance, best first.
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<MemoryRecord>, MemoryError>;

    /// Get total record count.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;

    /// Clear all records.
    async fn clear(&self) -> std::result::Result<(), MemoryError>;
}
