//! HTTP surface: axum routes over a TCP listener.
//!
//! ```text
//! POST /api            ─▶ user engine (agent.*)
//! POST /mcp            ─▶ provider engine (mcp.*, tools)
//! GET  /health, /tools, /logs, /history
//! POST /tools/reload
//! ```
//!
//! Both RPC routes answer `200` with the JSON-RPC body, or `204` when the
//! engine produced nothing (notifications).

pub mod client;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::daemon::ShutdownSignal;
use crate::logging::LogReader;
use crate::mcp::McpServer;
use crate::rpc::RpcEngine;

pub use client::{ClientError, DaemonClient};
pub use types::*;

/// Newest log entries returned when `/logs` is called without `limit`.
pub const DEFAULT_LOG_LIMIT: usize = 100;

/// Shared state accessible to all route handlers.
pub struct AppState {
    /// Engine behind `POST /api`.
    pub user: Arc<RpcEngine>,
    /// Provider-facing server behind `POST /mcp` and the `/tools` routes.
    pub mcp: Arc<McpServer>,
    /// Captured logs; `None` when no collector was installed.
    pub logs: Option<LogReader>,
    pub started_at: Instant,
}

/// Build the axum router with all routes.
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/api", post(handle_api))
        .route("/mcp", post(handle_mcp))
        .route("/health", get(handle_health))
        .route("/tools", get(handle_tools))
        .route("/tools/reload", post(handle_reload))
        .route("/logs", get(handle_logs))
        .route("/history", get(handle_history))
        .with_state(state)
}

/// Serve on `listener` until the shutdown signal is received.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown_rx: broadcast::Receiver<ShutdownSignal>,
) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("HTTP server shutting down");
        })
        .await
}

fn rpc_reply(reply: Option<String>) -> Response {
    match reply {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn error_reply(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

// ── Route handlers ──────────────────────────────────────────────────────

async fn handle_api(State(state): State<Arc<AppState>>, body: String) -> Response {
    rpc_reply(state.user.handle(&body).await)
}

async fn handle_mcp(State(state): State<Arc<AppState>>, body: String) -> Response {
    rpc_reply(state.mcp.handle(&body).await)
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::build_info::VERSION.to_string(),
        git_hash: crate::build_info::GIT_HASH.to_string(),
        build_profile: crate::build_info::BUILD_PROFILE.to_string(),
        tool_count: state.mcp.registry().snapshot().len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

async fn handle_tools(State(state): State<Arc<AppState>>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.mcp.registry().list(),
    })
}

async fn handle_reload(State(state): State<Arc<AppState>>) -> Json<ReloadResponse> {
    info!("registry reload requested over HTTP");
    let tool_count = state.mcp.reload();
    Json(ReloadResponse {
        status: "reloaded".to_string(),
        tool_count,
    })
}

async fn handle_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let Some(reader) = &state.logs else {
        return error_reply(
            StatusCode::SERVICE_UNAVAILABLE,
            "log collection is not enabled",
        );
    };

    let min_level = match query.level.as_deref().map(str::parse::<tracing::Level>) {
        None => None,
        Some(Ok(level)) => Some(level),
        Some(Err(_)) => {
            warn!(level = ?query.level, "rejected /logs level filter");
            return error_reply(StatusCode::BAD_REQUEST, "unknown log level");
        }
    };

    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let mut entries = reader.tail(limit, min_level);
    if let Some(after) = query.after {
        entries.retain(|e| e.seq > after);
    }
    Json(LogsResponse {
        entries,
        total: reader.len(),
    })
    .into_response()
}

async fn handle_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        entries: state.user.history(),
    })
}
