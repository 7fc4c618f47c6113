//! Configuration loading, validation, and management for lorekeep.
//!
//! Loads configuration from `~/.lorekeep/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use lorekeep_core::provider::PromptStyle;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.lorekeep/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Assistant identity
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Main model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Capability-selector side model
    #[serde(default)]
    pub selector: SelectorConfig,

    /// Tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Knowledge source configuration
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Long-term memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Chat history configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Self-contained query rewriting
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("assistant", &self.assistant)
            .field("model", &self.model)
            .field("selector", &self.selector)
            .field("tools", &self.tools)
            .field("knowledge", &self.knowledge)
            .field("memory", &self.memory)
            .field("history", &self.history)
            .field("rewrite", &self.rewrite)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// The prefix the assistant uses to identify itself in the chat
    #[serde(default = "default_ai_name")]
    pub name: String,

    /// The prefix labeling the human's messages
    #[serde(default = "default_human_prefix")]
    pub human_prefix: String,

    /// The system message for chat-style models
    #[serde(default = "default_system_message")]
    pub system_message: String,
}

fn default_ai_name() -> String {
    "Lorekeep".into()
}
fn default_human_prefix() -> String {
    "You".into()
}
fn default_system_message() -> String {
    "You are Lorekeep, a helpful AI assistant grounded in the user's knowledge bases. \
     Be accurate and concise, and admit when you don't know something."
        .into()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_ai_name(),
            human_prefix: default_human_prefix(),
            system_message: default_system_message(),
        }
    }
}

/// Temperature is either a fixed float or the keyword "dynamic", meaning
/// the capability selector chooses it per turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemperatureSetting {
    Fixed(f32),
    Keyword(String),
}

impl TemperatureSetting {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Keyword(k) if k == "dynamic")
    }

    /// Resolve to a concrete temperature, substituting `dynamic_value`
    /// when the setting is dynamic.
    pub fn resolve(&self, dynamic_value: f32) -> f32 {
        match self {
            Self::Fixed(t) => *t,
            Self::Keyword(_) => dynamic_value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// The LLM provider name
    #[serde(default = "default_provider")]
    pub provider: String,

    /// The model name
    #[serde(default = "default_model")]
    pub name: String,

    /// Prompt layout for this model's endpoint
    #[serde(default = "default_style")]
    pub style: PromptStyle,

    /// Temperature: a float in [0, 1] or "dynamic"
    #[serde(default = "default_temperature")]
    pub temperature: TemperatureSetting,

    /// Maximum tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum tool-use rounds per turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4".into()
}
fn default_style() -> PromptStyle {
    PromptStyle::Chat
}
fn default_temperature() -> TemperatureSetting {
    TemperatureSetting::Keyword("dynamic".into())
}
fn default_max_tokens() -> u32 {
    512
}
fn default_max_iterations() -> u32 {
    3
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_model(),
            style: default_style(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// The model used for capability selection and query rewriting
    #[serde(default = "default_selector_model")]
    pub model: String,

    /// Max tokens for the ability-list response
    #[serde(default = "default_selector_max_tokens")]
    pub max_tokens: u32,
}

fn default_selector_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_selector_max_tokens() -> u32 {
    50
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            model: default_selector_model(),
            max_tokens: default_selector_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Names of enabled tools. Empty = the agent loop is bypassed.
    #[serde(default = "default_tools")]
    pub enabled: Vec<String>,
}

fn default_tools() -> Vec<String> {
    vec!["Knowledge Bases".into()]
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: default_tools(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// JSONL file of knowledge passages. Missing file = empty knowledge base.
    #[serde(default = "default_knowledge_path")]
    pub passages_path: PathBuf,

    /// Maximum passages returned per retrieval
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_knowledge_path() -> PathBuf {
    AppConfig::config_dir().join("knowledge").join("passages.jsonl")
}
fn default_top_k() -> usize {
    5
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            passages_path: default_knowledge_path(),
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Backend: "file", "in_memory", or "none"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// Storage path for the file backend
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,

    /// Maximum records recalled per turn
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,
}

fn default_memory_backend() -> String {
    "file".into()
}
fn default_memory_path() -> PathBuf {
    AppConfig::config_dir().join("memory").join("memories.jsonl")
}
fn default_recall_limit() -> usize {
    5
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: default_memory_path(),
            recall_limit: default_recall_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Whether to persist chat history between runs
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Where the history JSON file lives
    #[serde(default = "default_history_path")]
    pub path: PathBuf,

    /// Character budget before oldest messages spill to long-term memory
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_true() -> bool {
    true
}
fn default_history_path() -> PathBuf {
    AppConfig::config_dir().join("history.json")
}
fn default_max_chars() -> usize {
    6000
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            persist: true,
            path: default_history_path(),
            max_chars: default_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Whether to rewrite user inputs into self-contained retrieval queries
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.lorekeep/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `LOREKEEP_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("LOREKEEP_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        // Allow env var to override the model
        if let Ok(model) = std::env::var("LOREKEEP_MODEL") {
            config.model.name = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".lorekeep")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.model.temperature {
            TemperatureSetting::Fixed(t) => {
                if !(0.0..=1.0).contains(t) {
                    return Err(ConfigError::ValidationError(
                        "model.temperature must be between 0.0 and 1.0".into(),
                    ));
                }
            }
            TemperatureSetting::Keyword(k) => {
                if k != "dynamic" {
                    return Err(ConfigError::ValidationError(format!(
                        "model.temperature must be a float or \"dynamic\", got \"{k}\""
                    )));
                }
            }
        }

        if self.model.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "model.max_tokens must be greater than 0".into(),
            ));
        }

        if !matches!(self.memory.backend.as_str(), "file" | "in_memory" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "memory.backend must be one of file, in_memory, none; got \"{}\"",
                self.memory.backend
            )));
        }

        if self.history.max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "history.max_chars must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            assistant: AssistantConfig::default(),
            model: ModelConfig::default(),
            selector: SelectorConfig::default(),
            tools: ToolsConfig::default(),
            knowledge: KnowledgeConfig::default(),
            memory: MemoryConfig::default(),
            history: HistoryConfig::default(),
            rewrite: RewriteConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.provider, "openai");
        assert!(config.model.temperature.is_dynamic());
        assert_eq!(config.tools.enabled, vec!["Knowledge Bases".to_string()]);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.assistant.name, config.assistant.name);
        assert_eq!(parsed.model.max_iterations, config.model.max_iterations);
        assert!(parsed.model.temperature.is_dynamic());
    }

    #[test]
    fn fixed_temperature_parses_from_toml() {
        let config: AppConfig = toml::from_str("[model]\ntemperature = 0.7\n").unwrap();
        assert_eq!(config.model.temperature, TemperatureSetting::Fixed(0.7));
        assert!(!config.model.temperature.is_dynamic());
        assert!((config.model.temperature.resolve(0.2) - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn dynamic_temperature_resolves_to_decision_value() {
        let setting = TemperatureSetting::Keyword("dynamic".into());
        assert!((setting.resolve(0.4) - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            model: ModelConfig {
                temperature: TemperatureSetting::Fixed(1.5),
                ..ModelConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_temperature_keyword_rejected() {
        let config = AppConfig {
            model: ModelConfig {
                temperature: TemperatureSetting::Keyword("auto".into()),
                ..ModelConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_memory_backend_rejected() {
        let config = AppConfig {
            memory: MemoryConfig {
                backend: "redis".into(),
                ..MemoryConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.assistant.name, "Lorekeep");
    }

    #[test]
    fn invalid_toml_file_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "model = not valid toml").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("Lorekeep"));
        assert!(toml_str.contains("dynamic"));
        assert!(toml_str.contains("Knowledge Bases"));
    }
}
