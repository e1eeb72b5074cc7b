//! Chat-completion integration.
//!
//! The built-in generation tools and the routing reasoner talk to an
//! OpenAI-compatible endpoint through the [`LlmProvider`] trait, so tests can
//! substitute a canned provider.

pub mod client;
pub mod types;

use std::sync::Arc;

use switchboard_config::LlmConfig;

use crate::BoxFuture;

pub use client::ChatCompletionsClient;
pub use types::{ChatMessage, ChatRequest, Completion, Role, TokenUsage};

/// Errors from a completion call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("authentication rejected (HTTP {0}); check the API key")]
    Auth(u16),

    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// A chat-completions backend.
pub trait LlmProvider: Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &str;

    fn complete(&self, request: ChatRequest) -> BoxFuture<'_, Result<Completion, LlmError>>;
}

/// Build the provider described by the `[llm]` config section.
pub fn create_provider(config: &LlmConfig) -> Arc<dyn LlmProvider> {
    let api_key = config.resolve_api_key();
    if api_key.is_empty() {
        tracing::warn!(
            env = %config.api_key_env,
            "no LLM API key configured; generation tools and the reasoner will fail"
        );
    }
    Arc::new(ChatCompletionsClient::new(&config.base_url, api_key))
}
