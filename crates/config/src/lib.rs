//! Configuration loading, validation, and management for AdMuse.
//!
//! Loads configuration from `~/.admuse/config.toml` with environment
//! variable overrides. Validates all settings at startup. Missing
//! credentials are not a startup failure: the provider key is checked when
//! the gateway first talks to the model, and the generation key is a
//! per-call tool error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default system instructions for the creative agent.
const DEFAULT_SYSTEM_PROMPT: &str = "\
You are AdMuse, a creative agent that helps brands make marketing content with AI.

Be brief. 1-2 sentences max per response. Let the visuals do the talking.

Tools return URLs directly. Never repeat the raw URL. Embed it properly:
- Images: ![img](url)
- Videos: [Watch video](url)

Add a one-liner about what you made. Don't explain your process.

If the user uploads images, use the provided image URLs with your tools.

You can generate images, edit product photos, and create marketing videos.
Bias toward action: generate first, ask questions only when truly needed.

For videos: first generate a start frame image, then an end frame image,
then use generate_video with both URLs to create the video.

After delivering, offer a short next step.";

/// The root configuration structure.
///
/// Maps directly to `~/.admuse/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key (env: `ADMUSE_API_KEY` or `ANTHROPIC_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Fal API key for image/video generation (env: `FAL_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fal_key: Option<String>,

    /// Model to use for every round-trip
    #[serde(default = "default_model")]
    pub model: String,

    /// Display name of the agent
    #[serde(default = "default_agent_name")]
    pub agent_name: String,

    /// System instructions sent on every round-trip
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Output-length ceiling per round-trip
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Tool-call budget per user turn — the termination bound of the
    /// agent loop
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: u32,

    /// Gateway (HTTP/WebSocket) configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_agent_name() -> String {
    "AdMuse".into()
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_max_tool_calls() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            fal_key: None,
            model: default_model(),
            agent_name: default_agent_name(),
            system_prompt: default_system_prompt(),
            max_tokens: default_max_tokens(),
            max_tool_calls: default_max_tool_calls(),
            gateway: GatewayConfig::default(),
        }
    }
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
            .field("fal_key", &redact(&self.fal_key))
            .field("model", &self.model)
            .field("agent_name", &self.agent_name)
            .field("max_tokens", &self.max_tokens)
            .field("max_tool_calls", &self.max_tool_calls)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl AppConfig {
    /// Load configuration from the default path (`~/.admuse/config.toml`).
    ///
    /// Environment variables take precedence over the file:
    /// - `ADMUSE_API_KEY`, then `ANTHROPIC_API_KEY` → provider credential
    /// - `FAL_KEY` → generation credential
    /// - `ADMUSE_MODEL` → model override
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(key) = std::env::var("ADMUSE_API_KEY") {
            config.api_key = Some(key);
        } else if config.api_key.is_none() {
            config.api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        }

        if let Ok(key) = std::env::var("FAL_KEY") {
            config.fal_key = Some(key);
        }

        if let Ok(model) = std::env::var("ADMUSE_MODEL") {
            config.model = model;
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
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".admuse")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be greater than 0".into(),
            ));
        }

        if self.max_tool_calls == 0 {
            return Err(ConfigError::ValidationError(
                "max_tool_calls must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if a provider API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}
