//! The agent loop state machine — one user turn from input to answer.
//!
//! States: `SelectAction` (initial), `Dispatch`, `Finalize`, `Done`.
//!
//! In `SelectAction` the agent compiles a tool-enabled prompt, calls the
//! model, and tries to extract an action. Parse failure means the output
//! *is* the answer. In `Dispatch` the action runs against the registry and
//! the result is appended to the action log; a failed dispatch forbids any
//! further tool attempts this turn. `Finalize` compiles a tool-disabled
//! prompt over the accumulated log and takes that output verbatim.
//!
//! The iteration budget counts successful dispatches, so the action log
//! never grows past `max_iterations`. An agent with no tools at all skips
//! the loop entirely: one tool-disabled call produces the answer.

use lorekeep_core::chat::{ChatMessage, render_transcript};
use lorekeep_core::error::{Error, ProviderError};
use lorekeep_core::provider::{CompletionRequest, PromptStyle, Provider};
use lorekeep_core::tool::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::extractor::{ActionRequest, extract_action};
use crate::prompt::{self, PromptInput};

/// Immutable per-turn configuration snapshot.
///
/// Built fresh each turn from the base config plus the capability
/// decision; never mutated in place.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// The prefix the assistant uses to identify itself in the chat.
    pub ai_name: String,

    /// System message for chat-style models.
    pub system_message: String,

    /// Model name.
    pub model: String,

    /// Prompt layout for this model's endpoint.
    pub style: PromptStyle,

    /// Temperature, already resolved (never "dynamic" here).
    pub temperature: f32,

    /// Max tokens per response.
    pub max_tokens: u32,

    /// Maximum tool-use rounds for this turn.
    pub max_iterations: u32,

    /// Names of the tools this turn may use.
    pub tool_names: Vec<String>,
}

/// One entry in the turn's action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// The action name the model chose.
    pub action: String,

    /// The input it supplied.
    pub input: String,

    /// The tool output, or the textual failure description.
    pub output: String,
}

/// The result of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The final answer text.
    pub answer: String,

    /// The action log, or `None` when the loop was bypassed because no
    /// tools are configured.
    pub action_log: Option<Vec<ActionLogEntry>>,
}

/// The loop's state. `Done` is terminal.
enum TurnState {
    SelectAction,
    Dispatch(ActionRequest),
    Finalize,
    Done(String),
}

/// Drives one user turn. Owns its tool registry for the turn's lifetime;
/// independent turns share nothing mutable.
pub struct Agent {
    config: AgentConfig,
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
}

impl Agent {
    pub fn new(config: AgentConfig, provider: Arc<dyn Provider>, tools: ToolRegistry) -> Self {
        Self {
            config,
            provider,
            tools,
        }
    }

    /// Run one turn.
    ///
    /// `input` is the user's message(s) for this turn; `history` is prior
    /// turns only. Knowledge and memory arrive pre-retrieved as text.
    /// Only a provider failure aborts the turn.
    pub async fn run_turn(
        &self,
        input: &[ChatMessage],
        history: &[ChatMessage],
        relevant_knowledge: &str,
        long_term_memory: &str,
    ) -> Result<TurnOutcome, Error> {
        let input_str = render_transcript(input).trim().to_string();

        // No tools at all: a single tool-disabled call answers directly.
        if self.tools.is_empty() {
            let answer = self
                .call_model(false, &input_str, history, relevant_knowledge, long_term_memory, &[])
                .await?;
            return Ok(TurnOutcome {
                answer,
                action_log: None,
            });
        }

        info!(
            model = %self.config.model,
            max_iterations = self.config.max_iterations,
            tools = self.tools.len(),
            "Agent turn starting"
        );

        let mut log: Vec<ActionLogEntry> = Vec::new();
        let mut iterations: u32 = 0;
        let mut state = TurnState::SelectAction;

        loop {
            state = match state {
                TurnState::SelectAction => {
                    if iterations >= self.config.max_iterations {
                        warn!(
                            max_iterations = self.config.max_iterations,
                            "Iteration budget exhausted, forcing final answer"
                        );
                        TurnState::Finalize
                    } else {
                        let output = self
                            .call_model(
                                true,
                                &input_str,
                                history,
                                relevant_knowledge,
                                long_term_memory,
                                &log,
                            )
                            .await?;

                        match extract_action(&output) {
                            Some(request) => {
                                debug!(action = %request.name, input = %request.input, "Action extracted");
                                TurnState::Dispatch(request)
                            }
                            // Parse failure is the exit signal: the output
                            // is the answer to the user.
                            None => TurnState::Done(output),
                        }
                    }
                }

                TurnState::Dispatch(request) => {
                    let dispatch = self.tools.dispatch(&request.name, &request.input).await;
                    debug!(
                        action = %request.name,
                        succeeded = dispatch.succeeded,
                        "Action dispatched"
                    );
                    let succeeded = dispatch.succeeded;
                    log.push(ActionLogEntry {
                        action: request.name,
                        input: request.input,
                        output: dispatch.output,
                    });

                    if succeeded {
                        iterations += 1;
                        TurnState::SelectAction
                    } else {
                        // Fail fast: no more tool attempts after any failure.
                        TurnState::Finalize
                    }
                }

                TurnState::Finalize => {
                    let output = self
                        .call_model(
                            false,
                            &input_str,
                            history,
                            relevant_knowledge,
                            long_term_memory,
                            &log,
                        )
                        .await?;
                    TurnState::Done(output)
                }

                TurnState::Done(answer) => {
                    info!(
                        iterations,
                        actions = log.len(),
                        "Agent turn completed"
                    );
                    return Ok(TurnOutcome {
                        answer,
                        action_log: Some(log),
                    });
                }
            };
        }
    }

    /// Compile a prompt and call the model once, stripping any leading
    /// assistant-name prefix from the output.
    async fn call_model(
        &self,
        tool_use_allowed: bool,
        input_str: &str,
        history: &[ChatMessage],
        relevant_knowledge: &str,
        long_term_memory: &str,
        action_log: &[ActionLogEntry],
    ) -> Result<String, ProviderError> {
        let (tool_names, tool_descriptions) = if tool_use_allowed {
            (self.tools.names_line(), self.tools.descriptions())
        } else {
            (String::new(), String::new())
        };

        let prompt_input = PromptInput {
            ai_name: &self.config.ai_name,
            user_input: input_str,
            relevant_knowledge,
            long_term_memory,
            history,
            tool_use_allowed,
            tool_names: &tool_names,
            tool_descriptions: &tool_descriptions,
            action_log,
        };

        let payload = prompt::compile(self.config.style, &self.config.system_message, &prompt_input);

        let request = CompletionRequest {
            model: self.config.model.clone(),
            payload,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let output = self.provider.complete(request).await?;
        Ok(strip_name_prefix(&output, &self.config.ai_name))
    }
}

/// Strip any leading `"{ai_name}:"` prefixes from model output and trim.
/// Models sometimes echo their own speaker label back.
pub fn strip_name_prefix(output: &str, ai_name: &str) -> String {
    let prefix = format!("{ai_name}:");
    let mut out = output.trim();
    while let Some(rest) = out.strip_prefix(&prefix) {
        out = rest.trim_start();
    }
    out.trim().to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────
