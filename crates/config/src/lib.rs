//! Configuration loading, validation, and management for Ponder.
//!
//! Loads configuration from `~/.ponder/config.toml` with environment
//! variable overrides. Every field has a serde default so an empty file —
//! or no file at all — yields a runnable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variables honored as overrides.
pub const ENV_API_KEY: &str = "PONDER_API_KEY";
pub const ENV_BASE_URL: &str = "PONDER_BASE_URL";
pub const ENV_MODEL: &str = "PONDER_MODEL";
pub const ENV_DB: &str = "PONDER_DB";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
///
/// Maps directly to `~/.ponder/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Engine settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Memory store settings
    #[serde(default)]
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// API key for the backend endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// The agent's display name
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// The system prompt composed in front of every exchange
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Hard cap on capability dispatch rounds per invocation
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Token budget for the reconstructed history window
    #[serde(default = "default_history_budget")]
    pub history_budget: usize,
}

fn default_agent_name() -> String {
    "Ponder".into()
}
fn default_system_prompt() -> String {
    "You're a helpful agent".into()
}
fn default_max_depth() -> u32 {
    5
}
fn default_history_budget() -> usize {
    512
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            system_prompt: default_system_prompt(),
            max_depth: default_max_depth(),
            history_budget: default_history_budget(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Path of the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "memo.db".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.backend.api_key))
            .field("base_url", &self.backend.base_url)
            .field("model", &self.backend.model)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .finish()
    }
}

impl AppConfig {
    /// The default config file location: `~/.ponder/config.toml`.
    pub fn default_path() -> PathBuf {
        std::env::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ponder")
            .join("config.toml")
    }

    /// Load from a file, apply env overrides, validate.
    ///
    /// A missing file is not an error — defaults apply.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let config: AppConfig = toml::from_str(&raw)?;
            debug!(path = %path.display(), "Config loaded");
            config
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            AppConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides on top of the file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            if !key.is_empty() {
                self.backend.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.is_empty() {
                self.backend.base_url = url;
            }
        }
        if let Ok(model) = std::env::var(ENV_MODEL) {
            if !model.is_empty() {
                self.backend.model = model;
            }
        }
        if let Ok(db) = std::env::var(ENV_DB) {
            if !db.is_empty() {
                self.memory.db_path = db;
            }
        }
    }

    /// Reject configurations the engine cannot run with.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.model.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.model must not be empty".into()));
        }
        if self.agent.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "agent.max_depth must be at least 1".into(),
            ));
        }
        if self.agent.history_budget == 0 {
            return Err(ConfigError::Invalid(
                "agent.history_budget must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
