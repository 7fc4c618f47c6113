//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use lorekeep_core::error::MemoryError;
use lorekeep_core::memory::{MemoryRecord, MemoryStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::keyword;

/// An in-memory store that keeps records in a Vec.
/// Useful for testing and sessions where persistence isn't needed.
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn store(&self, content: &str) -> Result<String, MemoryError> {
        let record = MemoryRecord {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            score: 0.0,
        };
        let id = record.id.clone();
        self.records.write().await.push(record);
        Ok(id)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self.records.read().await;
        Ok(keyword::rank(&records, query, limit))
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.records.read().await.len())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.records.write().await.clear();
        Ok(())
    }
}
