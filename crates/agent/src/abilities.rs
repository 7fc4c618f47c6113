//! Capability selection — deciding per turn what the agent may use.
//!
//! A side model call classifies the user input against a fixed set of
//! abilities, returned as a comma-separated list of integer codes. The
//! derivation from abilities to a [`CapabilityDecision`] is pure and
//! deterministic; only the classification itself touches the model.
//!
//! Selection failure is recoverable: the caller falls back to the
//! conservative default (all context enabled, all tools allowed,
//! temperature 0.0) rather than aborting the turn.

use lorekeep_core::error::ProviderError;
use lorekeep_core::provider::{CompletionRequest, PromptPayload, Provider, RoleMessage};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// The fixed ability set the selector model chooses from.
///
/// The integer codes are part of the protocol; do not renumber them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    KnowledgeBases,
    Memory,
    CreativeWriting,
    CasualConversation,
}

impl Ability {
    /// The protocol code for this ability.
    pub fn code(self) -> i64 {
        match self {
            Self::KnowledgeBases => 1,
            Self::Memory => 2,
            Self::CreativeWriting => 3,
            Self::CasualConversation => 4,
        }
    }

    /// Look up an ability by protocol code. Unknown codes are `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::KnowledgeBases),
            2 => Some(Self::Memory),
            3 => Some(Self::CreativeWriting),
            4 => Some(Self::CasualConversation),
            _ => None,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::KnowledgeBases => {
                "Knowledge bases - the ability to retrieve information from domain-specific or \
                 company-specific knowledge bases"
            }
            Self::Memory => {
                "Memory - the ability to remember previous conversations with the user; this is \
                 the ONLY way to remember anything the user has previously said, so you most \
                 likely need this ability"
            }
            Self::CreativeWriting => {
                "Creative writing ability - the ability to write creatively, such as for essays, \
                 poetry, comedy, screenwriting, etc."
            }
            Self::CasualConversation => {
                "Casual conversation ability - the ability to have a casual conversation"
            }
        }
    }

    const ALL: [Ability; 4] = [
        Self::KnowledgeBases,
        Self::Memory,
        Self::CreativeWriting,
        Self::CasualConversation,
    ];
}

/// Which tools a turn may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedTools {
    /// Every configured tool (the conservative fallback).
    All,
    /// Only the named tools (possibly none).
    Only(BTreeSet<String>),
}

impl AllowedTools {
    /// Whether a tool name is permitted.
    pub fn permits(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(name),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::All => false,
            Self::Only(names) => names.is_empty(),
        }
    }
}

/// The derived per-turn decision. Short-lived: consumed when building the
/// turn's AgentConfig, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDecision {
    pub needs_knowledge: bool,
    pub needs_memory: bool,
    pub temperature: f32,
    pub allowed_tools: AllowedTools,
}

impl CapabilityDecision {
    /// The conservative fallback used when selection fails: every kind of
    /// context enabled, every tool allowed, deterministic output.
    pub fn conservative() -> Self {
        Self {
            needs_knowledge: true,
            needs_memory: true,
            temperature: 0.0,
            allowed_tools: AllowedTools::All,
        }
    }

    /// Derive a decision from a selected ability set.
    ///
    /// Temperature: base 0.2; creative writing raises it to 0.9, else
    /// casual conversation raises it to 0.8. If any tool ends up allowed
    /// and the temperature exceeds 0.4 it is clamped to 0.4 — tool-calling
    /// reliability degrades at high temperature.
    pub fn from_abilities(abilities: &[Ability]) -> Self {
        let needs_knowledge = abilities.contains(&Ability::KnowledgeBases);
        let needs_memory = abilities.contains(&Ability::Memory);

        let mut temperature = 0.2;
        if abilities.contains(&Ability::CreativeWriting) {
            temperature = 0.9;
        } else if abilities.contains(&Ability::CasualConversation) {
            temperature = 0.8;
        }

        let mut allowed = BTreeSet::new();
        if needs_knowledge {
            allowed.insert(lorekeep_tools::KNOWLEDGE_BASES.to_string());
        }
        let allowed_tools = AllowedTools::Only(allowed);

        if !allowed_tools.is_empty() && temperature > 0.4 {
            temperature = 0.4;
        }

        Self {
            needs_knowledge,
            needs_memory,
            temperature,
            allowed_tools,
        }
    }
}

/// Errors from capability selection. All of them are recoverable by
/// falling back to [`CapabilityDecision::conservative`].
#[derive(Debug)]
pub enum SelectionError {
    /// The selector model call itself failed.
    Provider(ProviderError),
    /// The model's ability list could not be parsed as integers.
    Unparseable { raw: String },
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider(e) => write!(f, "Capability selection call failed: {e}"),
            Self::Unparseable { raw } => {
                write!(f, "Could not parse ability list: `{raw}`")
            }
        }
    }
}

impl std::error::Error for SelectionError {}

impl From<ProviderError> for SelectionError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

/// Parse a comma-separated integer list into abilities.
///
/// Any token that fails integer parsing fails the whole parse — a partial
/// salvage would silently disable context the model asked for. Integer
/// codes outside the known set parse fine and are ignored.
pub fn parse_abilities(raw: &str) -> Result<Vec<Ability>, SelectionError> {
    let mut abilities = Vec::new();
    for token in raw.split(',') {
        let code: i64 = token
            .trim()
            .parse()
            .map_err(|_| SelectionError::Unparseable {
                raw: raw.to_string(),
            })?;
        if let Some(ability) = Ability::from_code(code) {
            if !abilities.contains(&ability) {
                abilities.push(ability);
            }
        }
    }
    Ok(abilities)
}

/// Issues the per-turn classification call and derives the decision.
pub struct CapabilitySelector {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: u32,
}

impl CapabilitySelector {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
        }
    }

    fn classification_prompt(input: &str) -> String {
        let ability_lines = Ability::ALL
            .iter()
            .map(|a| format!("{}: {}", a.code(), a.describe()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are an AGI assistant. Determine what abilities you need in order to respond \
             to the following user input:\n\n\
             User input: {input}\n\n\
             Here are the abilities you have to choose from:\n\
             {ability_lines}\n\n\
             Select the abilities you need to best respond to the user input. You can choose \
             as many abilities as you need, but don't choose any abilities that you don't \
             need. You MUST respond with a comma-separated list of integers corresponding to \
             the abilities you need, and nothing else.\n\n\
             Abilities needed:"
        )
    }

    /// Classify the input and derive the turn's capability decision.
    pub async fn decide(&self, input: &str) -> Result<CapabilityDecision, SelectionError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            payload: PromptPayload::Chat {
                system: String::new(),
                messages: vec![RoleMessage::user(Self::classification_prompt(input))],
            },
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let raw = self.provider.complete(request).await?;
        let abilities = parse_abilities(&raw)?;
        debug!(?abilities, "Capability selection");

        Ok(CapabilityDecision::from_abilities(&abilities))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
