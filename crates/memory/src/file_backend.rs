//! File-based memory store — persistent JSON-lines storage.
//!
//! Each line of the file is a JSON-encoded `MemoryRecord`. Records load
//! into memory on creation and flush to disk on every mutation, giving
//! fast reads with durable writes. The file is human-inspectable.

use async_trait::async_trait;
use chrono::Utc;
use lorekeep_core::error::MemoryError;
use lorekeep_core::memory::{MemoryRecord, MemoryStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::keyword;

/// A file-backed memory store using JSONL (one JSON object per line).
pub struct FileBackend {
    path: PathBuf,
    records: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl FileBackend {
    /// Create a new file-based store at the given path.
    ///
    /// If the file exists, records are loaded from it.
    /// If the file does not exist, starts empty (file created on first write).
    pub fn new(path: PathBuf) -> Self {
        let records = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = records.len(), "File memory store loaded");
        Self {
            path,
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Load records from a JSONL file.
    fn load_from_disk(path: &PathBuf) -> Vec<MemoryRecord> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(), // File doesn't exist yet — start empty
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<MemoryRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted memory record");
                    None
                }
            })
            .collect()
    }

    /// Flush all records to disk as JSONL.
    async fn flush(&self) -> Result<(), MemoryError> {
        let records = self.records.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MemoryError::Storage(e.to_string()))?;
        }

        let mut out = String::new();
        for record in records.iter() {
            let line = serde_json::to_string(record)
                .map_err(|e| MemoryError::Storage(e.to_string()))?;
            out.push_str(&line);
            out.push('\n');
        }

        std::fs::write(&self.path, out).map_err(|e| MemoryError::Storage(e.to_string()))
    }
}

#[async_trait]
impl MemoryStore for FileBackend {
    fn name(&self) -> &str {
        "file"
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
        self.flush().await?;
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
        self.flush().await
    }
}
