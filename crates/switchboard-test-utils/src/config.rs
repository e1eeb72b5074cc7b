//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use switchboard_config::{AppConfig, KeywordProfile};

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .listen_port(5050)
///     .enabled_tools(&["text_generation"])
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn listen_addr(mut self, addr: &str) -> Self {
        self.config.server.listen_addr = addr.to_string();
        self
    }

    pub fn listen_port(mut self, port: u16) -> Self {
        self.config.server.listen_port = port;
        self
    }

    pub fn mcp_url(mut self, url: &str) -> Self {
        self.config.server.mcp_url = Some(url.to_string());
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn enabled_tools(mut self, tools: &[&str]) -> Self {
        self.config.tools.enabled = tools.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Replace the keyword profiles.
    pub fn profiles(mut self, profiles: Vec<KeywordProfile>) -> Self {
        self.config.routing.profiles = profiles;
        self
    }

    pub fn fallback_tool(mut self, tool: &str) -> Self {
        self.config.routing.fallback_tool = tool.to_string();
        self
    }

    pub fn reasoner_enabled(mut self, enabled: bool) -> Self {
        self.config.routing.reasoner.enabled = enabled;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
