//! Tool trait — the abstraction over agent actions.
//!
//! Tools are what the agent can invoke between model calls: a knowledge
//! base search, plus whatever a host registers. A tool takes an input
//! string and produces an output string; its description is injected
//! verbatim into the prompt so the model can decide when to use it.

use async_trait::async_trait;
use std::collections::BTreeMap;
use crate::error::ToolError;

/// The core Tool trait.
///
/// Tools are registered in the ToolRegistry and made available to the
/// agent loop for the lifetime of one turn.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool, exactly as the model must spell it
    /// (e.g., "Knowledge Bases").
    fn name(&self) -> &str;

    /// What this tool does (sent to the LLM verbatim).
    fn description(&self) -> &str;

    /// Invoke the tool on the given input string.
    async fn invoke(&self, input: &str) -> std::result::Result<String, ToolError>;
}

/// The outcome of dispatching an action.
///
/// Dispatch never raises: an unknown tool name and a failing tool both come
/// back as an output string with `succeeded` false, so the loop can feed the
/// failure into the conversation instead of dying on it.
#[derive(Debug, Clone)]
pub struct Dispatch {
    /// The tool output, or a textual description of the failure.
    pub output: String,

    /// True only when invocation completed without an error.
    pub succeeded: bool,
}

/// A registry of available tools, keyed by name.
///
/// The agent loop uses this to:
/// 1. Render tool names and descriptions into the prompt
/// 2. Look up and invoke tools when the model requests them
///
/// Keys are held in a `BTreeMap` so prompt listings are deterministic.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Tool names joined for the prompt's action list (e.g. "A, B").
    pub fn names_line(&self) -> String {
        self.names().join(", ")
    }

    /// Name-and-description blocks for the prompt, one per tool.
    pub fn descriptions(&self) -> String {
        self.tools
            .values()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch an action against the registry.
    ///
    /// Unknown name → deterministic "not a valid tool" output, not
    /// succeeded. Tool error → textual error output, not succeeded. A tool
    /// failure never propagates as an unhandled fault.
    pub async fn dispatch(&self, action: &str, input: &str) -> Dispatch {
        let Some(tool) = self.tools.get(action) else {
            return Dispatch {
                output: format!("Error, {action} is not a valid tool."),
                succeeded: false,
            };
        };

        match tool.invoke(input).await {
            Ok(output) => Dispatch {
                output,
                succeeded: true,
            },
            Err(e) => Dispatch {
                output: format!("Error using tool: {e}"),
                succeeded: false,
            },
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        async fn invoke(&self, input: &str) -> Result<String, ToolError> {
            Ok(input.to_string())
        }
    }

    /// A tool that always fails.
    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "broken".into(),
                reason: "backend unreachable".into(),
            })
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_prompt_renderings() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        registry.register(Box::new(BrokenTool));
        assert_eq!(registry.names_line(), "broken, echo");
        let descriptions = registry.descriptions();
        assert!(descriptions.contains("echo: Echoes back the input"));
        assert!(descriptions.contains("broken: Always fails"));
    }

    #[tokio::test]
    async fn dispatch_success() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let dispatch = registry.dispatch("echo", "hello world").await;
        assert!(dispatch.succeeded);
        assert_eq!(dispatch.output, "hello world");
    }

    #[tokio::test]
    async fn dispatch_unknown_tool_is_explicit() {
        let registry = ToolRegistry::new();
        let dispatch = registry.dispatch("Knowledge Bases2", "refund policy").await;
        assert!(!dispatch.succeeded);
        assert_eq!(
            dispatch.output,
            "Error, Knowledge Bases2 is not a valid tool."
        );
    }

    #[tokio::test]
    async fn dispatch_tool_failure_is_absorbed() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(BrokenTool));

        let dispatch = registry.dispatch("broken", "anything").await;
        assert!(!dispatch.succeeded);
        assert!(dispatch.output.starts_with("Error using tool:"));
        assert!(dispatch.output.contains("backend unreachable"));
    }
}
