//! Knowledge base query tool.
//!
//! Wraps the retrieval boundary as a tool the model can invoke mid-turn.
//! The description below is injected verbatim into the prompt so the model
//! knows when to reach for it.

use async_trait::async_trait;
use lorekeep_core::error::ToolError;
use lorekeep_core::retrieval::{Retriever, join_passages};
use lorekeep_core::tool::Tool;
use std::sync::Arc;
use tracing::debug;

pub struct KnowledgeBaseTool {
    source: Arc<dyn Retriever>,
}

impl KnowledgeBaseTool {
    pub fn new(source: Arc<dyn Retriever>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for KnowledgeBaseTool {
    fn name(&self) -> &str {
        super::KNOWLEDGE_BASES
    }

    fn description(&self) -> &str {
        "A knowledge base. Useful for when you need to answer questions about a specific topic. \
         Input should be a search query."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let passages = self
            .source
            .retrieve(input)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        debug!(query = input, count = passages.len(), "Knowledge base queried");
        Ok(join_passages(&passages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeep_core::error::RetrievalError;
    use lorekeep_core::retrieval::Passage;

    struct FixedRetriever(Vec<&'static str>);

    #[async_trait]
    impl Retriever for FixedRetriever {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn retrieve(&self, _query: &str) -> Result<Vec<Passage>, RetrievalError> {
            Ok(self
                .0
                .iter()
                .map(|c| Passage {
                    content: c.to_string(),
                })
                .collect())
        }
    }

    struct FailingRetriever;

    #[async_trait]
    impl Retriever for FailingRetriever {
        fn name(&self) -> &str {
            "failing"
        }
        async fn retrieve(&self, _query: &str) -> Result<Vec<Passage>, RetrievalError> {
            Err(RetrievalError::Backend("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn joins_passages_with_blank_lines() {
        let tool = KnowledgeBaseTool::new(Arc::new(FixedRetriever(vec![
            "Refunds within 30 days.",
            "Receipts required.",
        ])));
        let output = tool.invoke("refund policy").await.unwrap();
        assert_eq!(output, "Refunds within 30 days.\n\nReceipts required.");
    }

    #[tokio::test]
    async fn empty_retrieval_yields_empty_output() {
        let tool = KnowledgeBaseTool::new(Arc::new(FixedRetriever(vec![])));
        let output = tool.invoke("anything").await.unwrap();
        assert_eq!(output, "");
    }

    #[tokio::test]
    async fn retrieval_failure_becomes_tool_error() {
        let tool = KnowledgeBaseTool::new(Arc::new(FailingRetriever));
        let err = tool.invoke("anything").await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
        assert!(err.to_string().contains("connection refused"));
    }
}
