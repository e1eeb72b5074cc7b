#![deny(unsafe_code)]

//! Configuration loading and validation for Switchboard.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`AppConfig`] type as the central configuration structure,
//! and the [`routing`] module for keyword profiles used by tool selection.

/// Keyword profiles and routing defaults.
pub mod routing;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use routing::{KeywordProfile, ReasonerConfig, RoutingConfig};

/// Names of the capability providers that ship with the daemon.
pub const BUILTIN_TOOLS: [&str; 3] = ["text_generation", "code_generation", "web_search"];

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Chat-completions endpoint shared by the generation tools and the reasoner.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Built-in capability providers.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Tool selection settings.
    #[serde(default)]
    pub routing: RoutingConfig,
}

/// Configuration for the HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the daemon listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Port the daemon listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Remote provider endpoint (`http://host:port/mcp`).
    ///
    /// When unset, the agent talks to the in-process provider engine.
    #[serde(default)]
    pub mcp_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
            mcp_url: None,
        }
    }
}

impl ServerConfig {
    /// `addr:port` string suitable for binding or dialing.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    5000
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Number of log entries retained in memory for `GET /logs`.
    #[serde(default = "default_log_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            buffer_capacity: default_log_buffer_capacity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_buffer_capacity() -> usize {
    500
}

/// OpenAI-compatible chat-completions endpoint.
///
/// ## TOML Example
///
/// ```toml
/// [llm]
/// base_url = "https://api.groq.com/openai/v1/chat/completions"
/// api_key_env = "GROQ_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Full URL of the chat-completions endpoint.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,

    /// Inline API key. Takes precedence over `api_key_env`. Avoid in production.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key_env: default_llm_api_key_env(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the inline value or the environment.
    ///
    /// Returns an empty string when neither is set; requests will then fail
    /// with an authentication error at call time rather than at startup.
    pub fn resolve_api_key(&self) -> String {
        if let Some(ref key) = self.api_key {
            return key.clone();
        }
        std::env::var(&self.api_key_env).unwrap_or_default()
    }
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_llm_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

/// Built-in capability provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Tools the loader offers at discovery time.
    #[serde(default = "default_enabled_tools")]
    pub enabled: Vec<String>,

    /// Settings for `text_generation`.
    #[serde(default = "default_text_generation")]
    pub text_generation: GenerationToolConfig,

    /// Settings for `code_generation`.
    #[serde(default = "default_code_generation")]
    pub code_generation: GenerationToolConfig,

    /// Settings for `web_search`.
    #[serde(default)]
    pub web_search: WebSearchConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_tools(),
            text_generation: default_text_generation(),
            code_generation: default_code_generation(),
            web_search: WebSearchConfig::default(),
        }
    }
}

fn default_enabled_tools() -> Vec<String> {
    BUILTIN_TOOLS.iter().map(|s| s.to_string()).collect()
}

/// Model settings for a generation tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationToolConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

fn default_text_generation() -> GenerationToolConfig {
    GenerationToolConfig {
        model: "llama-3.3-70b-versatile".to_string(),
        temperature: 0.7,
        max_tokens: 1000,
    }
}

fn default_code_generation() -> GenerationToolConfig {
    GenerationToolConfig {
        model: "llama-3.3-70b-versatile".to_string(),
        temperature: 0.2,
        max_tokens: 800,
    }
}

/// Settings for the web search tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    /// JSON search endpoint (DuckDuckGo instant-answer API format).
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Maximum number of hits rendered into the result text.
    #[serde(default = "default_search_max_results")]
    pub max_results: usize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            max_results: default_search_max_results(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://api.duckduckgo.com/".to_string()
}

fn default_search_max_results() -> usize {
    5
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen_port == 0 {
            return Err(ConfigError::Validation(
                "server.listen_port must be non-zero".to_string(),
            ));
        }
        if self.server.listen_addr.is_empty() {
            return Err(ConfigError::Validation(
                "server.listen_addr must not be empty".to_string(),
            ));
        }
        if let Some(ref url) = self.server.mcp_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "server.mcp_url must be an http(s) URL, got {url:?}"
                )));
            }
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }
        if self.logging.buffer_capacity == 0 {
            return Err(ConfigError::Validation(
                "logging.buffer_capacity must be at least 1".to_string(),
            ));
        }

        if self.llm.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "llm.base_url must not be empty".to_string(),
            ));
        }

        for (i, name) in self.tools.enabled.iter().enumerate() {
            if !BUILTIN_TOOLS.contains(&name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "tools.enabled[{i}] must be one of {BUILTIN_TOOLS:?}, got {name:?}"
                )));
            }
        }
        for (section, tool) in [
            ("text_generation", &self.tools.text_generation),
            ("code_generation", &self.tools.code_generation),
        ] {
            if tool.model.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "tools.{section}.model must not be empty"
                )));
            }
            if !(0.0..=2.0).contains(&tool.temperature) {
                return Err(ConfigError::Validation(format!(
                    "tools.{section}.temperature must be in [0.0, 2.0], got {}",
                    tool.temperature
                )));
            }
            if tool.max_tokens == 0 {
                return Err(ConfigError::Validation(format!(
                    "tools.{section}.max_tokens must be non-zero"
                )));
            }
        }
        if self.tools.web_search.max_results == 0 {
            return Err(ConfigError::Validation(
                "tools.web_search.max_results must be at least 1".to_string(),
            ));
        }

        self.routing.validate()?;

        Ok(())
    }
}
