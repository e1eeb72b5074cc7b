//! Request/response bodies for the daemon's HTTP routes.
//!
//! Shared by the axum handlers and [`DaemonClient`](super::DaemonClient).

use serde::{Deserialize, Serialize};

use crate::logging::LogEntry;
use crate::registry::ToolDescriptor;
use crate::rpc::HistoryEntry;

/// `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub git_hash: String,
    pub build_profile: String,
    pub tool_count: usize,
    pub uptime_secs: u64,
}

/// `GET /tools`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolDescriptor>,
}

/// `POST /tools/reload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub status: String,
    pub tool_count: usize,
}

/// Query string accepted by `GET /logs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsQuery {
    /// Newest entries to return.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Minimum level (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default)]
    pub level: Option<String>,
    /// Only entries with a sequence number greater than this.
    #[serde(default)]
    pub after: Option<u64>,
}

/// `GET /logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    pub entries: Vec<LogEntry>,
    /// Entries held in the buffer before filtering.
    pub total: usize,
}

/// `GET /history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}

/// Generic error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
