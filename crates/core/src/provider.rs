//! Provider trait — the abstraction over LLM completion backends.
//!
//! A Provider knows how to send a prompt to an LLM and get plain text back.
//! The call is blocking request/response: the agent loop suspends at each
//! call and resumes only with its result. There is no streaming surface
//! because nothing downstream consumes partial output.
//!
//! Implementations: OpenAI-compatible endpoints, scripted mocks for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;

/// How prompts are laid out for a given model endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStyle {
    /// System message plus role-tagged messages (`/chat/completions`).
    Chat,
    /// One flat text prompt (legacy `/completions`).
    Completion,
}

/// The role of a chat-style message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged message for chat-style payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMessage {
    pub role: Role,
    pub content: String,
}

impl RoleMessage {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The prompt payload sent to a provider.
#[derive(Debug, Clone)]
pub enum PromptPayload {
    /// A single flat prompt for completion-style models.
    Text(String),

    /// A system message plus role-tagged messages for chat-style models.
    /// An empty system message is skipped on the wire.
    Chat {
        system: String,
        messages: Vec<RoleMessage>,
    },
}

/// A completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The model to use (e.g. "gpt-4", "gpt-3.5-turbo")
    pub model: String,

    /// The prompt payload.
    pub payload: PromptPayload,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The agent loop calls
/// `complete()` without knowing which provider is being used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get the generated text back, trimmed.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<String, ProviderError>;
}
