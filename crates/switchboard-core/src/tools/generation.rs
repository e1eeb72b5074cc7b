//! Text and code generation backed by a chat-completion model.

use std::sync::Arc;

use serde_json::Value;
use switchboard_config::GenerationToolConfig;

use crate::BoxFuture;
use crate::llm::{ChatRequest, LlmProvider};
use crate::registry::{ProviderError, ToolDescriptor, ToolInvoker, ToolParams};

/// Which generation capability a [`GenerationTool`] provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Text,
    Code,
}

impl GenerationKind {
    pub fn tool_name(self) -> &'static str {
        match self {
            GenerationKind::Text => "text_generation",
            GenerationKind::Code => "code_generation",
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        match self {
            GenerationKind::Text => ToolDescriptor::new(
                self.tool_name(),
                "Generate detailed text explanations and answers",
            )
            .with_parameter("prompt", "The text prompt or question to generate a response for"),
            GenerationKind::Code => ToolDescriptor::new(
                self.tool_name(),
                "Generate code snippets and programming solutions",
            )
            .with_parameter("prompt", "Description of the code to generate"),
        }
    }
}

/// Sends the `prompt` parameter as a single user message.
pub struct GenerationTool {
    kind: GenerationKind,
    llm: Arc<dyn LlmProvider>,
    settings: GenerationToolConfig,
}

impl GenerationTool {
    pub fn new(kind: GenerationKind, llm: Arc<dyn LlmProvider>, settings: GenerationToolConfig) -> Self {
        Self { kind, llm, settings }
    }

    pub fn kind(&self) -> GenerationKind {
        self.kind
    }

    fn request(&self, prompt: &str) -> ChatRequest {
        ChatRequest::new(self.settings.model.as_str())
            .user(prompt)
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
    }
}

impl ToolInvoker for GenerationTool {
    fn invoke(&self, params: ToolParams) -> BoxFuture<'_, Result<Value, ProviderError>> {
        Box::pin(async move {
            let prompt = params
                .get("prompt")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| ProviderError::MissingParameter("prompt".to_string()))?;

            let completion = self
                .llm
                .complete(self.request(prompt))
                .await
                .map_err(|e| ProviderError::Upstream(format!("{} API error: {e}", self.llm.name())))?;

            Ok(Value::String(completion.text.trim().to_string()))
        })
    }
}
