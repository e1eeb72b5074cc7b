//! JSON-RPC 2.0 engine.
//!
//! One [`RpcEngine`] serves callers (`agent.*` methods) and a second one
//! serves capability providers (`mcp.*` plus one method per tool). Both share
//! the same validation, dispatch, notification and batch semantics.

pub mod engine;
pub mod history;
pub mod types;
pub mod validate;

pub use engine::{Handler, HandlerError, RpcEngine};
pub use history::{HISTORY_CAPACITY, HistoryEntry};
pub use types::{ErrorCode, Outcome, Params, RpcError, RpcResponse, require_str};
