//! HTTP client for a running daemon.
//!
//! Used by the CLI. Speaks HTTP/1.1 over a plain TCP connection with `hyper`,
//! one connection per request.

use hyper::body::Bytes;
use hyper::http::StatusCode;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::debug;

use super::types::*;

/// Errors from the daemon client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("daemon is not reachable at {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("daemon returned error: {0}")]
    Daemon(String),
}

/// Client for communicating with the Switchboard daemon over HTTP.
pub struct DaemonClient {
    addr: String,
}

impl DaemonClient {
    /// Create a client targeting `host:port`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send a request and return the status and body.
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(StatusCode, Bytes), ClientError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| ClientError::Connect {
                addr: self.addr.clone(),
                source: e,
            })?;

        let io = TokioIo::new(stream);

        let (mut sender, conn) =
            hyper::client::conn::http1::handshake::<_, http_body_util::Full<Bytes>>(io)
                .await
                .map_err(|e| ClientError::Request(format!("HTTP handshake failed: {e}")))?;

        // Drive the connection in the background
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!(error = %e, "daemon connection error");
            }
        });

        debug!(method, path, "daemon request");

        let http_method = method
            .parse::<hyper::Method>()
            .map_err(|e| ClientError::Request(format!("invalid method: {e}")))?;

        let mut builder = hyper::Request::builder()
            .method(http_method)
            .uri(path)
            .header("host", self.addr.as_str());
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }

        let req = builder
            .body(http_body_util::Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| ClientError::Request(format!("failed to build request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ClientError::Request(format!("request failed: {e}")))?;

        let status = resp.status();
        let resp_body = http_body_util::BodyExt::collect(resp.into_body())
            .await
            .map_err(|e| ClientError::Request(format!("failed to read response body: {e}")))?
            .to_bytes();

        if !status.is_success() {
            if let Ok(err) = serde_json::from_slice::<ErrorResponse>(&resp_body) {
                return Err(ClientError::Daemon(err.error));
            }
            return Err(ClientError::Request(format!("unexpected status: {status}")));
        }

        Ok((status, resp_body))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let (_, body) = self.request("GET", path, None).await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Parse(format!("{path}: {e}")))
    }

    // ── Typed API methods ──────────────────────────────────────────────

    /// Is the daemon running and responsive?
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get_json("/health").await
    }

    pub async fn tools(&self) -> Result<ToolsResponse, ClientError> {
        self.get_json("/tools").await
    }

    pub async fn reload_tools(&self) -> Result<ReloadResponse, ClientError> {
        let (_, body) = self.request("POST", "/tools/reload", None).await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Parse(format!("reload: {e}")))
    }

    pub async fn logs(&self, limit: usize) -> Result<LogsResponse, ClientError> {
        self.get_json(&format!("/logs?limit={limit}")).await
    }

    pub async fn history(&self) -> Result<HistoryResponse, ClientError> {
        self.get_json("/history").await
    }

    /// Post raw JSON-RPC text to `/api`. `None` means the daemon answered 204.
    pub async fn rpc(&self, payload: &str) -> Result<Option<String>, ClientError> {
        let (status, body) = self
            .request("POST", "/api", Some(payload.as_bytes().to_vec()))
            .await?;
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        String::from_utf8(body.to_vec())
            .map(Some)
            .map_err(|e| ClientError::Parse(format!("rpc: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use serde_json::{Value, json};
    use tokio::net::TcpListener;
    use tokio::sync::broadcast;

    use crate::mcp::McpServer;
    use crate::registry::{ToolCandidate, ToolLoader, ToolRegistry};
    use crate::rpc::{HandlerError, Params, RpcEngine};

    struct NoTools;

    impl ToolLoader for NoTools {
        fn candidates(&self) -> Vec<ToolCandidate> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_client_not_running_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = DaemonClient::new(addr);
        let result = client.health().await;
        assert!(matches!(result, Err(ClientError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_integration_server_client() {
        use super::super::{AppState, serve};

        let user = Arc::new(RpcEngine::new("user"));
        user.register("sum", |params: Params| async move {
            let bound = params.bind(&["a", "b"])?;
            let a = bound["a"].as_i64().unwrap_or_default();
            let b = bound["b"].as_i64().unwrap_or_default();
            Ok::<_, HandlerError>(json!(a + b))
        });
        let registry = Arc::new(ToolRegistry::new(Arc::new(NoTools)));
        registry.load();

        let state = Arc::new(AppState {
            user,
            mcp: McpServer::new(registry),
            logs: None,
            started_at: Instant::now(),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let server_handle = tokio::spawn(async move {
            serve(listener, state, shutdown_rx).await.unwrap();
        });

        let client = DaemonClient::new(addr);

        let health = client.health().await.unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.tool_count, 0);

        let reply = client
            .rpc(r#"{"jsonrpc":"2.0","method":"sum","params":[2,3],"id":1}"#)
            .await
            .unwrap()
            .unwrap();
        let reply: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(reply["result"], 5);

        let notified = client
            .rpc(r#"{"jsonrpc":"2.0","method":"sum","params":[2,3]}"#)
            .await
            .unwrap();
        assert!(notified.is_none());

        let history = client.history().await.unwrap();
        assert_eq!(history.entries.len(), 2);

        let tools = client.tools().await.unwrap();
        assert!(tools.tools.is_empty());

        let err = client.logs(10).await.unwrap_err();
        assert!(matches!(err, ClientError::Daemon(_)));

        let _ = shutdown_tx.send(crate::daemon::ShutdownSignal);
        let _ = tokio::time::timeout(Duration::from_secs(2), server_handle).await;
    }
}
