//! Client side of the provider engine, used by the agent.
//!
//! The agent always speaks JSON-RPC text to the provider engine, either in
//! process ([`LocalTransport`]) or over HTTP ([`HttpTransport`]).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Value, json};
use tracing::debug;

use crate::registry::{ToolDescriptor, ToolEnvelope, ToolParams};
use crate::rpc::types::JSONRPC_VERSION;
use crate::rpc::{Outcome, RpcError, RpcResponse};
use crate::{BoxFuture, COLLABORATOR_TIMEOUT};

use super::server::{LIST_TOOLS, McpServer, RELOAD_TOOLS};

/// Carries one request text to the provider engine.
///
/// `Ok(None)` means the engine sent nothing back.
pub trait Transport: Send + Sync {
    fn send(&self, body: String) -> BoxFuture<'_, Result<Option<String>, RpcError>>;
}

/// In-process transport.
pub struct LocalTransport {
    server: Arc<McpServer>,
}

impl LocalTransport {
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }
}

impl Transport for LocalTransport {
    fn send(&self, body: String) -> BoxFuture<'_, Result<Option<String>, RpcError>> {
        Box::pin(async move { Ok(self.server.handle(&body).await) })
    }
}

/// HTTP transport: POSTs request text to a remote provider engine.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(COLLABORATOR_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, body: String) -> BoxFuture<'_, Result<Option<String>, RpcError>> {
        Box::pin(async move {
            let resp = self
                .client
                .post(&self.url)
                .header("content-type", "application/json")
                .body(body)
                .send()
                .await
                .map_err(|e| RpcError::internal(format!("transport error: {e}")))?;

            let status = resp.status();
            if status == reqwest::StatusCode::NO_CONTENT {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(RpcError::internal(format!("transport error: HTTP {status}")));
            }
            resp.text()
                .await
                .map(Some)
                .map_err(|e| RpcError::internal(format!("transport error: {e}")))
        })
    }
}

/// Typed calls against the provider engine.
pub struct McpClient {
    transport: Box<dyn Transport>,
    next_id: AtomicU64,
}

impl McpClient {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn local(server: Arc<McpServer>) -> Self {
        Self::new(Box::new(LocalTransport::new(server)))
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self::new(Box::new(HttpTransport::new(url)))
    }

    /// Descriptors of all registered tools.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RpcError> {
        let mut result = self.request(LIST_TOOLS, json!({})).await?;
        let tools = result
            .get_mut("tools")
            .map(Value::take)
            .unwrap_or_default();
        serde_json::from_value(tools)
            .map_err(|e| RpcError::parse_error(format!("malformed tool list: {e}")))
    }

    /// Ask the provider engine to rediscover. Returns the new tool count.
    pub async fn reload_tools(&self) -> Result<u64, RpcError> {
        let result = self.request(RELOAD_TOOLS, json!({})).await?;
        result["tool_count"]
            .as_u64()
            .ok_or_else(|| RpcError::parse_error("reload result has no tool_count"))
    }

    /// Invoke a tool. Transport and protocol failures become error envelopes.
    pub async fn call_tool(&self, name: &str, params: ToolParams) -> ToolEnvelope {
        self.request(name, Value::Object(params)).await.into()
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": JSONRPC_VERSION,
            "method": method,
            "params": params,
            "id": id,
        })
        .to_string();
        debug!(method, id, "provider request");

        let raw = self
            .transport
            .send(body)
            .await?
            .ok_or_else(|| RpcError::internal("no response from provider engine"))?;

        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| RpcError::parse_error(format!("malformed provider response: {e}")))?;

        match RpcResponse::from_value(&value) {
            Some(RpcResponse {
                outcome: Outcome::Result(result),
                ..
            }) => Ok(result),
            Some(RpcResponse {
                outcome: Outcome::Error(err),
                ..
            }) => Err(err),
            None => Err(RpcError::parse_error(
                "provider response has neither result nor error",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::ErrorCode;

    /// Replays a fixed reply to every request.
    struct Canned {
        reply: Result<Option<String>, RpcError>,
    }

    impl Transport for Canned {
        fn send(&self, body: String) -> BoxFuture<'_, Result<Option<String>, RpcError>> {
            let request: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(request["jsonrpc"], "2.0");
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }
    }

    fn client(reply: Result<Option<String>, RpcError>) -> McpClient {
        McpClient::new(Box::new(Canned { reply }))
    }

    #[tokio::test]
    async fn test_list_tools_decodes() {
        let c = client(Ok(Some(
            json!({"jsonrpc": "2.0", "result": {"tools": [{"name": "a", "description": "d"}]}, "id": 1})
                .to_string(),
        )));
        let tools = c.list_tools().await.unwrap();
        assert_eq!(tools[0].name, "a");
    }

    #[tokio::test]
    async fn test_call_tool_result() {
        let c = client(Ok(Some(
            json!({"jsonrpc": "2.0", "result": "ok", "id": 1}).to_string(),
        )));
        assert_eq!(
            c.call_tool("t", ToolParams::new()).await,
            ToolEnvelope::Result(json!("ok"))
        );
    }

    #[tokio::test]
    async fn test_call_tool_remote_error() {
        let c = client(Ok(Some(
            json!({"jsonrpc": "2.0", "error": {"code": -32000, "message": "down"}, "id": 1})
                .to_string(),
        )));
        match c.call_tool("t", ToolParams::new()).await {
            ToolEnvelope::Error(e) => assert_eq!(e.message, "down"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_internal() {
        let c = client(Err(RpcError::internal("transport error: refused")));
        match c.call_tool("t", ToolParams::new()).await {
            ToolEnvelope::Error(e) => assert_eq!(e.kind(), ErrorCode::InternalError),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let c = client(Ok(Some("<html>".to_string())));
        match c.call_tool("t", ToolParams::new()).await {
            ToolEnvelope::Error(e) => assert_eq!(e.kind(), ErrorCode::ParseError),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_reply() {
        let c = client(Ok(None));
        assert!(c.list_tools().await.is_err());
    }

    #[tokio::test]
    async fn test_reload_tools_count() {
        let c = client(Ok(Some(
            json!({"jsonrpc": "2.0", "result": {"status": "reloaded", "tool_count": 2}, "id": 1})
                .to_string(),
        )));
        assert_eq!(c.reload_tools().await.unwrap(), 2);
    }
}
