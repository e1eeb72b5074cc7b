//! External reasoner strategy.
//!
//! A [`Reasoner`] classifies a message into one of the offered tool names.
//! Its raw output is validated by [`ReasonerVerdict::from_value`]; any
//! failure sends the router to keyword scoring.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::BoxFuture;
use crate::llm::{ChatRequest, LlmProvider};

/// Why the reasoner could not produce a decision.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReasonerError {
    #[error("reasoner timed out after {0}s")]
    Timeout(u64),

    #[error("reasoner call failed: {0}")]
    Call(String),

    #[error("malformed reasoner output: {0}")]
    Malformed(String),

    #[error("reasoner output is missing '{0}'")]
    MissingField(&'static str),

    #[error("reasoner chose '{0}', which was not offered")]
    UnknownTool(String),

    #[error("reasoner confidence {0} is outside 0..=100")]
    ConfidenceOutOfRange(f64),
}

/// Classifies a message given the names of the available tools.
///
/// Returns the raw JSON object the reasoner produced.
pub trait Reasoner: Send + Sync {
    fn classify<'a>(
        &'a self,
        message: &'a str,
        tools: &'a [String],
    ) -> BoxFuture<'a, Result<Value, ReasonerError>>;
}

/// A validated reasoner decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasonerVerdict {
    pub tool: String,
    pub confidence: u8,
    pub reasoning: String,
}

impl ReasonerVerdict {
    /// Validate raw reasoner output against the offered tools.
    ///
    /// `recommended_tool` is accepted as an alias for `tool`.
    pub fn from_value(value: &Value, offered: &[String]) -> Result<Self, ReasonerError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ReasonerError::Malformed("expected a JSON object".to_string()))?;

        let tool = obj
            .get("tool")
            .or_else(|| obj.get("recommended_tool"))
            .ok_or(ReasonerError::MissingField("tool"))?
            .as_str()
            .ok_or_else(|| ReasonerError::Malformed("'tool' must be a string".to_string()))?;
        if !offered.iter().any(|t| t == tool) {
            return Err(ReasonerError::UnknownTool(tool.to_string()));
        }

        let confidence = obj
            .get("confidence")
            .ok_or(ReasonerError::MissingField("confidence"))?
            .as_f64()
            .ok_or_else(|| ReasonerError::Malformed("'confidence' must be a number".to_string()))?;
        if !(0.0..=100.0).contains(&confidence) {
            return Err(ReasonerError::ConfidenceOutOfRange(confidence));
        }

        let reasoning = obj
            .get("reasoning")
            .ok_or(ReasonerError::MissingField("reasoning"))?
            .as_str()
            .ok_or_else(|| ReasonerError::Malformed("'reasoning' must be a string".to_string()))?;

        Ok(Self {
            tool: tool.to_string(),
            confidence: confidence.round() as u8,
            reasoning: reasoning.to_string(),
        })
    }
}

/// Reasoner backed by a small chat-completion model.
pub struct LlmReasoner {
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl LlmReasoner {
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    fn request(&self, message: &str, tools: &[String]) -> ChatRequest {
        let prompt = format!(
            "Analyze the user's query and decide which tool should handle it.\n\n\
             Available tools: {tools}\n\n\
             User query: \"{message}\"\n\n\
             Guidelines:\n\
             - writing code, implementing, building programs or algorithms: code_generation\n\
             - real-time data such as bookings, prices, news, weather, current events: web_search\n\
             - explanations, definitions, concepts, general knowledge: text_generation\n\
             - only choose from the available tools\n\n\
             Respond with JSON only:\n\
             {{\"tool\": \"tool_name\", \"confidence\": 0-100, \"reasoning\": \"brief explanation\"}}",
            tools = tools.join(", "),
        );
        ChatRequest::new(self.model.as_str())
            .system("You are a query routing expert. Respond only with valid JSON.")
            .user(prompt)
            .temperature(0.1)
            .max_tokens(200)
    }
}

impl Reasoner for LlmReasoner {
    fn classify<'a>(
        &'a self,
        message: &'a str,
        tools: &'a [String],
    ) -> BoxFuture<'a, Result<Value, ReasonerError>> {
        Box::pin(async move {
            let completion = self
                .llm
                .complete(self.request(message, tools))
                .await
                .map_err(|e| ReasonerError::Call(e.to_string()))?;
            debug!(model = %completion.model, output = %completion.text, "reasoner replied");
            parse_output(&completion.text)
        })
    }
}

/// Parse model output, tolerating a surrounding Markdown code fence.
pub fn parse_output(text: &str) -> Result<Value, ReasonerError> {
    let body = strip_fence(text.trim());
    let value: Value =
        serde_json::from_str(body).map_err(|e| ReasonerError::Malformed(e.to_string()))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(ReasonerError::Malformed("expected a JSON object".to_string()))
    }
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
