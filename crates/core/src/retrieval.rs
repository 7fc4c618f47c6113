//! Retrieval boundary — knowledge bases and anything else passage-shaped.
//!
//! The core never talks to a vector database directly. It consumes ranked
//! passages through this trait and concatenates their contents with
//! blank-line separators to form prompt context blocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::RetrievalError;

/// A retrieved passage of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// The text content of the passage.
    pub content: String,
}

/// The retrieval boundary: a query in, ranked passages out.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The backend name (e.g. "file_passages").
    fn name(&self) -> &str;

    /// Retrieve passages relevant to the query, best first.
    async fn retrieve(
        &self,
        query: &str,
    ) -> std::result::Result<Vec<Passage>, RetrievalError>;
}

/// Join passage contents with blank-line separators.
pub fn join_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
