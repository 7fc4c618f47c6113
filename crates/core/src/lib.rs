//! # Lorekeep Core
//!
//! Domain types, traits, and error definitions for the lorekeep
//! conversational agent. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here: the model
//! completion boundary (`Provider`), the knowledge retrieval boundary
//! (`Retriever`), the long-term memory store (`MemoryStore`), and the tool
//! surface (`Tool`). Implementations live in their respective crates. This
//! enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod chat;
pub mod error;
pub mod memory;
pub mod provider;
pub mod retrieval;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use chat::{ChatMessage, render_transcript};
pub use error::{Error, Result};
pub use memory::{MemoryRecord, MemoryStore};
pub use provider::{CompletionRequest, PromptPayload, PromptStyle, Provider, Role, RoleMessage};
pub use retrieval::{Passage, Retriever, join_passages};
pub use tool::{Dispatch, Tool, ToolRegistry};
