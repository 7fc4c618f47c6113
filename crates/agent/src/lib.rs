//! The core agent loop — the heart of lorekeep.
//!
//! One user turn flows through these stages:
//!
//! 1. **Rewrite** the input into a self-contained retrieval query
//! 2. **Select capabilities** — a side model call decides what context and
//!    tools this turn needs, deriving a temperature and an allowed-tool list
//! 3. **Snapshot** a fresh per-turn [`AgentConfig`] from the base config
//!    plus the decision
//! 4. **Retrieve** knowledge and long-term memory if the decision asks
//! 5. **Run the loop**: compile a prompt, call the model, extract an
//!    action; dispatch it and repeat, or take the output as the answer
//! 6. **Update history**, spilling trimmed messages into long-term memory
//!
//! The loop continues until the model responds without a well-formed
//! action request, a dispatch fails, or the iteration budget runs out.

pub mod abilities;
pub mod extractor;
pub mod history;
pub mod prompt;
pub mod rewrite;
pub mod session;
pub mod turn;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use abilities::{Ability, AllowedTools, CapabilityDecision, CapabilitySelector, SelectionError};
pub use extractor::{ActionRequest, extract_action};
pub use history::ChatHistory;
pub use prompt::{PromptInput, compile, squeeze_blank_lines};
pub use rewrite::QueryRewriter;
pub use session::{ChatSession, TurnReport};
pub use turn::{ActionLogEntry, Agent, AgentConfig, TurnOutcome};
