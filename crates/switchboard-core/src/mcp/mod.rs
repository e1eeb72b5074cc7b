//! Provider-facing JSON-RPC engine and its client.

pub mod client;
pub mod server;

pub use client::{HttpTransport, LocalTransport, McpClient, Transport};
pub use server::McpServer;
