#![deny(unsafe_code)]

//! Switchboard core runtime.
//!
//! A JSON-RPC 2.0 tool-routing agent. Callers send natural-language messages
//! to the user-facing [`RpcEngine`]; the [`Agent`] picks a capability with the
//! [`Router`], checks it against the [`ToolRegistry`] and invokes it through
//! the provider-facing [`McpServer`].
//!
//! ```text
//! ┌────────┐  agent.*   ┌───────────┐   ┌────────┐
//! │ caller │───────────▶│ RpcEngine │──▶│ Agent  │──▶ Router
//! └────────┘            └───────────┘   └───┬────┘
//!                                           │ McpClient (local or HTTP)
//!                                           ▼
//!                       ┌───────────┐   ┌──────────────┐
//!                       │ McpServer │──▶│ ToolRegistry │──▶ providers
//!                       └───────────┘   └──────────────┘
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A type-erased, `Send`-safe, boxed future: the return type for async trait
/// methods that require dynamic dispatch (`dyn Trait`).
///
/// Native `async fn` in traits produces opaque return types that are **not**
/// object-safe. Traits consumed via `Arc<dyn Trait>` must return a concrete
/// `Pin<Box<dyn Future>>` instead. This alias keeps those signatures readable.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Upper bound on any single call to an external collaborator
/// (capability provider, reasoner, remote provider engine).
pub const COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Request orchestration: conversational check, selection, execution.
pub mod agent;
/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Daemon runtime that wires engines, registry and HTTP surface together.
pub mod daemon;
/// Chat-completion client used by generation tools and the reasoner.
pub mod llm;
/// In-memory log collector served over HTTP.
pub mod logging;
/// Provider-facing engine and the client the agent uses to reach it.
pub mod mcp;
/// Capability registry with atomic reload.
pub mod registry;
/// Tool selection strategies and confidence governance.
pub mod routing;
/// JSON-RPC 2.0 engine.
pub mod rpc;
/// HTTP surface (axum) and its client.
pub mod server;
/// Per-request status event log.
pub mod status;
/// Built-in capability providers.
pub mod tools;

pub use agent::Agent;
pub use daemon::Daemon;
pub use logging::{LogCollector, LogReader};
pub use mcp::{McpClient, McpServer};
pub use registry::{ToolDescriptor, ToolEnvelope, ToolRegistry};
pub use routing::Router;
pub use rpc::RpcEngine;

/// Seconds since the Unix epoch as a float.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Duration in seconds rounded to millisecond precision.
pub fn rounded_secs(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_secs() {
        assert_eq!(rounded_secs(Duration::from_micros(1_234_567)), 1.235);
        assert_eq!(rounded_secs(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_unix_timestamp_is_recent() {
        // 2020-01-01
        assert!(unix_timestamp() > 1_577_836_800.0);
    }
}
