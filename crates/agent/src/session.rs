//! Chat session — the per-turn orchestrator.
//!
//! A session owns the provider, the stores, and the rolling history, and
//! drives each turn through the full pipeline: rewrite the input, select
//! capabilities, snapshot a fresh per-turn config, retrieve the context
//! the decision asked for, run the agent loop, and fold the result back
//! into history.
//!
//! Every turn gets its own [`AgentConfig`] and tool registry; nothing
//! mutable is shared between turns beyond the history and the stores the
//! session owns.

use lorekeep_config::AppConfig;
use lorekeep_core::chat::{ChatMessage, render_transcript};
use lorekeep_core::memory::MemoryStore;
use lorekeep_core::provider::Provider;
use lorekeep_core::retrieval::{Retriever, join_passages};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::abilities::{CapabilityDecision, CapabilitySelector};
use crate::history::ChatHistory;
use crate::rewrite::QueryRewriter;
use crate::turn::{ActionLogEntry, Agent, AgentConfig, TurnOutcome};

/// What one completed turn produced.
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// The assistant's answer.
    pub answer: String,

    /// The action log, when the agent loop ran.
    pub action_log: Option<Vec<ActionLogEntry>>,

    /// The capability decision that shaped the turn.
    pub decision: CapabilityDecision,
}

/// A conversational session.
pub struct ChatSession {
    config: AppConfig,
    provider: Arc<dyn Provider>,
    selector: CapabilitySelector,
    rewriter: Option<QueryRewriter>,
    knowledge: Option<Arc<dyn Retriever>>,
    memory: Arc<dyn MemoryStore>,
    history: ChatHistory,
}

impl ChatSession {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn Provider>,
        knowledge: Option<Arc<dyn Retriever>>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        let selector = CapabilitySelector::new(
            provider.clone(),
            config.selector.model.clone(),
            config.selector.max_tokens,
        );
        let rewriter = if config.rewrite.enabled {
            Some(QueryRewriter::new(
                provider.clone(),
                config.selector.model.clone(),
            ))
        } else {
            None
        };
        let history = ChatHistory::new(config.history.max_chars);

        Self {
            config,
            provider,
            selector,
            rewriter,
            knowledge,
            memory,
            history,
        }
    }

    /// Replace the session's history (e.g. with one restored from disk).
    pub fn with_history(mut self, history: ChatHistory) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    /// Build the per-turn config snapshot from the base config plus the
    /// capability decision: dynamic temperature resolves to the decision's
    /// value, and the enabled tool list is filtered by what it allows.
    fn agent_config_for(&self, decision: &CapabilityDecision) -> AgentConfig {
        let temperature = self.config.model.temperature.resolve(decision.temperature);
        let tool_names: Vec<String> = self
            .config
            .tools
            .enabled
            .iter()
            .filter(|name| decision.allowed_tools.permits(name.as_str()))
            .cloned()
            .collect();

        AgentConfig {
            ai_name: self.config.assistant.name.clone(),
            system_message: self.config.assistant.system_message.clone(),
            model: self.config.model.name.clone(),
            style: self.config.model.style,
            temperature,
            max_tokens: self.config.model.max_tokens,
            max_iterations: self.config.model.max_iterations,
            tool_names,
        }
    }

    /// Run one turn against the session.
    ///
    /// Only a provider failure on the main model is fatal; selection and
    /// retrieval failures degrade to conservative defaults and empty
    /// context respectively.
    pub async fn respond(&mut self, user_text: &str) -> lorekeep_core::Result<TurnReport> {
        let input = vec![ChatMessage::new(
            &self.config.assistant.human_prefix,
            user_text,
        )];

        // Self-contained input for retrieval and classification.
        let expanded = match &self.rewriter {
            Some(rewriter) => {
                rewriter
                    .make_self_contained(self.history.messages(), &input)
                    .await
            }
            None => render_transcript(&input),
        };

        let decision = match self.selector.decide(&expanded).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "Capability selection failed, using conservative default");
                CapabilityDecision::conservative()
            }
        };
        debug!(?decision, "Turn capabilities");

        let agent_config = self.agent_config_for(&decision);

        let relevant_knowledge = if decision.needs_knowledge {
            self.retrieve_knowledge(&expanded).await
        } else {
            String::new()
        };

        let long_term_memory = if decision.needs_memory {
            self.recall_memory(&expanded).await
        } else {
            String::new()
        };

        let registry =
            lorekeep_tools::build_registry(&agent_config.tool_names, self.knowledge.clone())
                .map_err(lorekeep_core::Error::Tool)?;

        let agent = Agent::new(agent_config, self.provider.clone(), registry);
        let TurnOutcome { answer, action_log } = agent
            .run_turn(
                &input,
                self.history.messages(),
                &relevant_knowledge,
                &long_term_memory,
            )
            .await?;

        let response = ChatMessage::new(&self.config.assistant.name, answer.clone());
        self.history
            .push_turn(&input, response, self.memory.as_ref())
            .await;

        Ok(TurnReport {
            answer,
            action_log,
            decision,
        })
    }

    /// Move the whole history into long-term memory (used on exit when
    /// history persistence is off).
    pub async fn archive_history(&mut self) {
        self.history.archive_into(self.memory.as_ref()).await;
    }

    async fn retrieve_knowledge(&self, query: &str) -> String {
        let Some(knowledge) = &self.knowledge else {
            return String::new();
        };
        match knowledge.retrieve(query).await {
            Ok(passages) => join_passages(&passages),
            Err(e) => {
                warn!(error = %e, "Knowledge retrieval failed, continuing without it");
                String::new()
            }
        }
    }

    async fn recall_memory(&self, query: &str) -> String {
        match self
            .memory
            .search(query, self.config.memory.recall_limit)
            .await
        {
            Ok(records) => records
                .iter()
                .map(|r| r.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
            Err(e) => {
                warn!(error = %e, "Memory recall failed, continuing without it");
                String::new()
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
