//! Request orchestration.
//!
//! ```text
//! conversational check ──▶ CONVERSATIONAL
//!        │
//!        ▼
//! selection + governance ──▶ availability gate ──▶ UNAVAILABLE
//!                                   │
//!                                   ▼
//!                              execution ──▶ [synthesis] ──▶ SUCCESS | DEGRADED
//! ```

pub mod methods;

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::mcp::McpClient;
use crate::registry::{ToolDescriptor, ToolEnvelope, ToolParams};
use crate::routing::{Router, RoutingDecision, Strategy};
use crate::rpc::RpcError;
use crate::rounded_secs;
use crate::status::{StatusEvent, StatusLog};

pub use methods::register_methods;

/// Field surfaced from structured tool output.
pub const CONTENT_FIELD: &str = "content";

/// Reply to one chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub status_updates: Vec<StatusEvent>,
    pub metadata: ChatMetadata,
}

/// How a chat request was handled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMetadata {
    /// Tool that produced the response; `None` when nothing could run.
    pub tool_used: Option<String>,
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Seconds spent in the execution stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_time: Option<f64>,
    pub total_time: f64,
    /// Set when synthesis failed and the raw search result was returned.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatMetadata {
    fn record_decision(&mut self, decision: &RoutingDecision) {
        self.tool_used = Some(decision.tool.clone());
        self.confidence = decision.confidence;
        self.strategy = Some(decision.strategy);
        self.reasoning = Some(decision.reasoning.clone());
    }
}

/// Surface the content field of structured output, else the raw text.
pub fn normalize_output(output: &Value) -> String {
    match output {
        Value::Object(map) => match map.get(CONTENT_FIELD) {
            Some(Value::String(content)) => content.clone(),
            _ => output.to_string(),
        },
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => match map.get(CONTENT_FIELD) {
                Some(Value::String(content)) => content.clone(),
                _ => text.clone(),
            },
            _ => text.clone(),
        },
        other => other.to_string(),
    }
}

fn raw_text(output: &Value) -> String {
    match output {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// The routing agent behind the `agent.*` methods.
pub struct Agent {
    client: Arc<McpClient>,
    router: Router,
}

impl Agent {
    pub fn new(client: Arc<McpClient>, router: Router) -> Self {
        Self { client, router }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Answer a natural-language message.
    ///
    /// Always produces a reply; tool failures are reported in the response
    /// text and `metadata.error`.
    pub async fn chat(&self, message: &str) -> ChatReply {
        let started = Instant::now();
        let mut status = StatusLog::new();
        let mut metadata = ChatMetadata::default();
        status.emit("Analyzing request");

        let response = match self.router.converse(message, &mut status) {
            Some((kind, decision)) => {
                metadata.record_decision(&decision);
                kind.reply().to_string()
            }
            None => {
                let available = match self.client.list_tools().await {
                    Ok(tools) => tools.into_iter().map(|t| t.name).collect(),
                    Err(e) => {
                        warn!(error = %e, "could not list capabilities");
                        status.emit("Could not list capabilities");
                        Vec::new()
                    }
                };
                let decision = self.router.select(message, &available, &mut status).await;
                metadata.record_decision(&decision);
                self.execute(message, &decision, &mut status, &mut metadata)
                    .await
            }
        };

        metadata.total_time = rounded_secs(started.elapsed());
        status.emit("Request complete");
        info!(
            tool = metadata.tool_used.as_deref().unwrap_or("none"),
            confidence = metadata.confidence,
            total_time = metadata.total_time,
            "chat handled"
        );
        ChatReply {
            response,
            status_updates: status.into_events(),
            metadata,
        }
    }

    async fn execute(
        &self,
        message: &str,
        decision: &RoutingDecision,
        status: &mut StatusLog,
        metadata: &mut ChatMetadata,
    ) -> String {
        // Re-read the registry: it may have been reloaded since selection.
        let tools = match self.client.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                warn!(error = %e, "could not list capabilities for availability check");
                Vec::new()
            }
        };

        let Some(descriptor) = tools.iter().find(|t| t.name == decision.tool) else {
            status.emit(format!("Capability '{}' is not available", decision.tool));
            metadata.tool_used = None;
            metadata.confidence = 0;
            metadata.error = Some("Tool not available".to_string());
            let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
            return format!(
                "I don't have access to the '{}' capability. Available capabilities: {}",
                decision.tool,
                if names.is_empty() {
                    "none".to_string()
                } else {
                    names.join(", ")
                }
            );
        };

        let started = Instant::now();
        let response = if decision.tool == self.router.config().search_tool {
            self.search_and_synthesize(message, descriptor, &tools, status, metadata)
                .await
        } else {
            self.run_single(message, descriptor, status, metadata).await
        };
        metadata.tool_time = Some(rounded_secs(started.elapsed()));
        response
    }

    async fn run_single(
        &self,
        message: &str,
        descriptor: &ToolDescriptor,
        status: &mut StatusLog,
        metadata: &mut ChatMetadata,
    ) -> String {
        status.emit(format!("Invoking {}", descriptor.name));
        match self.invoke_with_message(descriptor, message).await {
            ToolEnvelope::Result(output) => {
                status.emit(format!("{} completed", descriptor.name));
                normalize_output(&output)
            }
            ToolEnvelope::Error(err) => {
                status.emit(format!("{} failed", descriptor.name));
                metadata.error = Some(err.message.clone());
                format!("Tool execution failed: {}", err.message)
            }
        }
    }

    async fn search_and_synthesize(
        &self,
        message: &str,
        search: &ToolDescriptor,
        tools: &[ToolDescriptor],
        status: &mut StatusLog,
        metadata: &mut ChatMetadata,
    ) -> String {
        status.emit(format!("Searching with {}", search.name));
        let started = Instant::now();
        let envelope = self.invoke_with_message(search, message).await;
        metadata.search_time = Some(rounded_secs(started.elapsed()));

        let results = match envelope {
            ToolEnvelope::Result(output) => raw_text(&output),
            ToolEnvelope::Error(err) => {
                status.emit("Search failed");
                metadata.error = Some(err.message.clone());
                return format!("Search failed: {}", err.message);
            }
        };

        let synthesis_tool = &self.router.config().synthesis_tool;
        let Some(synthesizer) = tools.iter().find(|t| &t.name == synthesis_tool) else {
            status.emit("Synthesis unavailable, returning raw search results");
            metadata.degraded = true;
            return results;
        };

        status.emit(format!("Synthesizing answer with {}", synthesizer.name));
        let prompt = format!(
            "Based on these search results:\n{results}\n\n\
             Provide a concise, well-structured answer to: {message}"
        );
        let started = Instant::now();
        let envelope = self.invoke_with_message(synthesizer, &prompt).await;
        metadata.synthesis_time = Some(rounded_secs(started.elapsed()));

        match envelope {
            ToolEnvelope::Result(output) => normalize_output(&output),
            ToolEnvelope::Error(err) => {
                warn!(error = %err, "synthesis failed, returning raw search results");
                status.emit("Synthesis failed, returning raw search results");
                metadata.degraded = true;
                results
            }
        }
    }

    async fn invoke_with_message(&self, descriptor: &ToolDescriptor, text: &str) -> ToolEnvelope {
        let mut params = ToolParams::new();
        params.insert(
            descriptor.primary_parameter().to_string(),
            Value::String(text.to_string()),
        );
        self.client.call_tool(&descriptor.name, params).await
    }

    /// Invoke a tool directly, bypassing routing.
    pub async fn execute_tool(&self, name: &str, params: ToolParams) -> ToolEnvelope {
        info!(tool = name, "direct tool execution");
        self.client.call_tool(name, params).await
    }

    pub async fn list_capabilities(&self) -> Result<Vec<ToolDescriptor>, RpcError> {
        self.client.list_tools().await
    }

    /// Reload the registry, then list what it now holds.
    pub async fn refresh_capabilities(&self) -> Result<Vec<ToolDescriptor>, RpcError> {
        let count = self.client.reload_tools().await?;
        info!(tools = count, "capabilities refreshed");
        self.client.list_tools().await
    }
}
