//! Local passage store — a keyword-scored stand-in for a production
//! vector-search knowledge base.
//!
//! Passages live in a JSONL file, one `{"content": "..."}` object per
//! line. Retrieval scores each passage against the query and returns the
//! best matches, so the knowledge-base tool and the knowledge context
//! block work end-to-end without an external service.

use async_trait::async_trait;
use lorekeep_core::error::RetrievalError;
use lorekeep_core::retrieval::{Passage, Retriever};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::keyword;

/// A file-backed passage store implementing the retrieval boundary.
pub struct FilePassages {
    passages: Vec<Passage>,
    top_k: usize,
}

impl FilePassages {
    /// Load passages from a JSONL file.
    ///
    /// A missing file yields an empty store: retrieval returns no
    /// passages rather than failing.
    pub fn new(path: PathBuf, top_k: usize) -> Self {
        let passages = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = passages.len(), "Passage store loaded");
        Self { passages, top_k }
    }

    /// Build a store directly from passage texts (used in tests and by
    /// hosts that assemble knowledge programmatically).
    pub fn from_contents(contents: Vec<String>, top_k: usize) -> Self {
        Self {
            passages: contents
                .into_iter()
                .map(|content| Passage { content })
                .collect(),
            top_k,
        }
    }

    fn load_from_disk(path: &PathBuf) -> Vec<Passage> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Passage>(line) {
                Ok(passage) => Some(passage),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted passage");
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

#[async_trait]
impl Retriever for FilePassages {
    fn name(&self) -> &str {
        "file_passages"
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, RetrievalError> {
        let mut scored: Vec<(f32, &Passage)> = self
            .passages
            .iter()
            .map(|p| (keyword::score(&p.content, query), p))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, p)| p.clone())
            .collect())
    }
}
