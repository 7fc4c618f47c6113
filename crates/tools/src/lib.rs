//! Built-in tool implementations for lorekeep.
//!
//! The registry is built once per turn from the configured tool-name list.
//! Requesting a name nobody recognizes is a configuration error, not a
//! silent skip.

pub mod knowledge_base;

pub use knowledge_base::KnowledgeBaseTool;

use lorekeep_core::Retriever;
use lorekeep_core::error::ToolError;
use lorekeep_core::tool::ToolRegistry;
use std::sync::Arc;

/// The name of the knowledge-base tool, exactly as the model must spell it.
pub const KNOWLEDGE_BASES: &str = "Knowledge Bases";

/// Build a tool registry from a list of requested tool names.
///
/// The knowledge-base tool needs a retrieval backend; requesting it
/// without one configured is an explicit error.
pub fn build_registry(
    names: &[String],
    knowledge: Option<Arc<dyn Retriever>>,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    for name in names {
        match name.as_str() {
            KNOWLEDGE_BASES => {
                let source = knowledge.clone().ok_or_else(|| ToolError::Unavailable {
                    tool_name: KNOWLEDGE_BASES.into(),
                    reason: "no knowledge source configured".into(),
                })?;
                registry.register(Box::new(KnowledgeBaseTool::new(source)));
            }
            other => return Err(ToolError::UnrecognizedName(other.to_string())),
        }
    }
    Ok(registry)
}
