//! No-op memory store — used when long-term memory is disabled.

use async_trait::async_trait;
use lorekeep_core::error::MemoryError;
use lorekeep_core::memory::{MemoryRecord, MemoryStore};

/// A store that silently discards everything and never recalls anything.
pub struct NoopMemory;

#[async_trait]
impl MemoryStore for NoopMemory {
    fn name(&self) -> &str {
        "none"
    }

    async fn store(&self, _content: &str) -> Result<String, MemoryError> {
        Ok(String::new())
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        Ok(())
    }
}
