//! HTTP client for OpenAI-compatible chat-completions endpoints.
//!
//! Groq is the default endpoint; OpenAI, Ollama and vLLM speak the same
//! format.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{BoxFuture, COLLABORATOR_TIMEOUT};

use super::types::{ChatMessage, ChatRequest, Completion, TokenUsage};
use super::{LlmError, LlmProvider};

/// Upstream error bodies are cut to this many characters.
const ERROR_BODY_LIMIT: usize = 200;
/// Used when a 429 carries no usable `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Bearer-authenticated chat-completions client.
pub struct ChatCompletionsClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl ChatCompletionsClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(COLLABORATOR_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl LlmProvider for ChatCompletionsClient {
    fn name(&self) -> &str {
        "chat-completions"
    }

    fn complete(&self, request: ChatRequest) -> BoxFuture<'_, Result<Completion, LlmError>> {
        Box::pin(async move {
            debug!(model = %request.model, endpoint = %self.endpoint, "chat completion request");

            let resp = self
                .http
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&WireRequest::from(&request))
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        LlmError::Timeout(COLLABORATOR_TIMEOUT.as_secs())
                    } else {
                        LlmError::Transport(e.to_string())
                    }
                })?;

            let status = resp.status();
            if !status.is_success() {
                let retry_after = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse().ok());
                let body = resp.text().await.unwrap_or_default();
                return Err(status_error(status, retry_after, &body));
            }

            let wire: WireResponse = resp
                .json()
                .await
                .map_err(|e| LlmError::Malformed(e.to_string()))?;
            completion_from(wire, &request.model)
        })
    }
}

fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Auth(status.as_u16()),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        _ => LlmError::Status {
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
        },
    }
}

fn completion_from(wire: WireResponse, requested_model: &str) -> Result<Completion, LlmError> {
    let choice = wire
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Malformed("response has no choices".to_string()))?;
    Ok(Completion {
        text: choice.message.content.unwrap_or_default(),
        model: wire.model.unwrap_or_else(|| requested_model.to_string()),
        finish_reason: choice.finish_reason,
        usage: wire.usage,
    })
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

impl<'a> From<&'a ChatRequest> for WireRequest<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}
