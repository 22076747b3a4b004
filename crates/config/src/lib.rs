//! Configuration loading and validation for Plume.
//!
//! Loads configuration from `~/.plume/config.toml` with environment
//! variable overrides, validated before the runtime is wired up.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Everything the binary needs to run, in one struct.
///
/// Maps directly to `~/.plume/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Orchestration settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Long-term memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Owner-specific persona overrides (owner id → extra system prompt)
    #[serde(default)]
    pub profiles: HashMap<String, String>,
}

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
            .field("provider", &self.provider)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("memory", &self.memory)
            .field("gateway", &self.gateway)
            .field("profiles", &self.profiles.keys())
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, e.g. "openai" or "openrouter"
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Chat model
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Chat completion request timeout in seconds
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,

    /// Embedding request timeout in seconds
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_chat_model() -> String {
    "gpt-4o".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_chat_timeout_secs() -> u64 {
    60
}
fn default_embed_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_url: default_api_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            chat_timeout_secs: default_chat_timeout_secs(),
            embed_timeout_secs: default_embed_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Baseline persona prompt shared by all sessions
    #[serde(default = "default_baseline_prompt")]
    pub baseline_prompt: String,

    /// Context window size in turns
    #[serde(default = "default_window_turns")]
    pub window_turns: usize,

    /// Upper bound on model/tool rounds per turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Image shortcut trigger phrases. Empty = built-in defaults.
    #[serde(default)]
    pub shortcut_phrases: Vec<String>,
}

fn default_baseline_prompt() -> String {
    "You are Plume, a helpful assistant for writing and creative work.".into()
}
fn default_window_turns() -> usize {
    11
}
fn default_max_tool_rounds() -> u32 {
    8
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            baseline_prompt: default_baseline_prompt(),
            window_turns: default_window_turns(),
            max_tool_rounds: default_max_tool_rounds(),
            shortcut_phrases: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Web fetch timeout in seconds
    #[serde(default = "default_web_fetch_timeout_secs")]
    pub web_fetch_timeout_secs: u64,

    /// Web fetch extracted-text budget in characters
    #[serde(default = "default_web_fetch_char_budget")]
    pub web_fetch_char_budget: usize,

    /// Image generation model
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Image generation timeout in seconds
    #[serde(default = "default_image_timeout_secs")]
    pub image_timeout_secs: u64,
}

fn default_web_fetch_timeout_secs() -> u64 {
    5
}
fn default_web_fetch_char_budget() -> usize {
    8000
}
fn default_image_model() -> String {
    "dall-e-3".into()
}
fn default_image_timeout_secs() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            web_fetch_timeout_secs: default_web_fetch_timeout_secs(),
            web_fetch_char_budget: default_web_fetch_char_budget(),
            image_model: default_image_model(),
            image_timeout_secs: default_image_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Whether long-term memory is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Takeaways retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_true() -> bool {
    true
}
fn default_top_k() -> usize {
    3
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8787
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Load from the default path (~/.plume/config.toml), then apply env
    /// overrides: `PLUME_API_KEY` > `OPENAI_API_KEY` > `OPENROUTER_API_KEY`
    /// for the key, `PLUME_MODEL` for the chat model.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("PLUME_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("PLUME_MODEL") {
            config.provider.chat_model = model;
        }

        Ok(config)
    }

    /// Load and validate one specific file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file absent, running on defaults");
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

    pub fn config_dir() -> PathBuf {
        dirs_home().join(".plume")
    }

    /// Reject values the runtime cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.window_turns < 2 {
            return Err(ConfigError::ValidationError(
                "agent.window_turns must be at least 2".into(),
            ));
        }

        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_rounds must be at least 1".into(),
            ));
        }

        if self.tools.web_fetch_char_budget == 0 {
            return Err(ConfigError::ValidationError(
                "tools.web_fetch_char_budget must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// True once a key arrived from file or environment.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` output).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
            memory: MemoryConfig::default(),
            gateway: GatewayConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

/// Home directory for the per-user config location.
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
        assert_eq!(config.provider.name, "openai");
        assert_eq!(config.agent.window_turns, 11);
        assert_eq!(config.agent.max_tool_rounds, 8);
        assert_eq!(config.gateway.port, 8787);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.chat_model, config.provider.chat_model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.provider.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn tiny_window_rejected() {
        let mut config = AppConfig::default();
        config.agent.window_turns = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_tool_rounds_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_tool_rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().provider.name, "openai");
    }

    #[test]
    fn profiles_table_parsing() {
        let toml_str = r#"
[provider]
chat_model = "gpt-4o-mini"

[agent]
shortcut_phrases = ["make me a picture"]

[profiles]
owner_1 = "Answer in French."
owner_2 = "Keep replies under 100 words."
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.chat_model, "gpt-4o-mini");
        assert_eq!(config.agent.shortcut_phrases, vec!["make me a picture"]);
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.profiles["owner_1"], "Answer in French.");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o"));
        assert!(toml_str.contains("8787"));
    }
}
