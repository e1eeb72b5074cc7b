//! Method table and request dispatch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::BoxFuture;

use super::history::{History, HistoryEntry};
use super::types::{Params, RpcError, RpcResponse};
use super::validate::{self, Call, Incoming};

/// Failure raised by a method handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Application failure, reported with the server error code.
    #[error("{0}")]
    Failed(String),

    /// Unexpected fault inside the handler.
    #[error("internal error: {0}")]
    Internal(String),

    /// A fully formed error whose code is passed through unchanged.
    #[error("{0}")]
    Rpc(RpcError),
}

impl From<RpcError> for HandlerError {
    fn from(err: RpcError) -> Self {
        HandlerError::Rpc(err)
    }
}

impl HandlerError {
    pub fn into_rpc_error(self) -> RpcError {
        match self {
            HandlerError::Failed(message) => RpcError::server(message),
            HandlerError::Internal(message) => RpcError::internal(message),
            HandlerError::Rpc(err) => err,
        }
    }
}

/// An invocable method.
///
/// Implemented for any `Fn(Params) -> impl Future` closure, so most methods
/// are registered inline.
pub trait Handler: Send + Sync {
    fn call(&self, params: Params) -> BoxFuture<'_, Result<Value, HandlerError>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Params) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    fn call(&self, params: Params) -> BoxFuture<'_, Result<Value, HandlerError>> {
        Box::pin(self(params))
    }
}

/// A JSON-RPC 2.0 engine: a method table plus request history.
///
/// The engine never fails outward. Every input produces either a response
/// text or nothing (notifications and all-notification batches).
pub struct RpcEngine {
    name: String,
    methods: RwLock<HashMap<String, Arc<dyn Handler>>>,
    history: History,
}

impl RpcEngine {
    /// Create an engine. The name only appears in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: RwLock::new(HashMap::new()),
            history: History::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a handler, replacing any existing one with the same name.
    pub fn register(&self, method: impl Into<String>, handler: impl Handler + 'static) {
        self.register_arc(method, Arc::new(handler));
    }

    pub fn register_arc(&self, method: impl Into<String>, handler: Arc<dyn Handler>) {
        let method = method.into();
        debug!(engine = %self.name, method = %method, "method registered");
        self.methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method, handler);
    }

    /// Remove a handler. Returns whether it was present.
    pub fn unregister(&self, method: &str) -> bool {
        let removed = self
            .methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(method)
            .is_some();
        if removed {
            debug!(engine = %self.name, method, "method unregistered");
        }
        removed
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Recent requests and responses, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.snapshot()
    }

    /// Process one raw message.
    ///
    /// Returns the response text, or `None` when nothing should be sent back.
    pub async fn handle(&self, raw: &str) -> Option<String> {
        let incoming = match validate::parse_message(raw) {
            Ok(incoming) => incoming,
            Err(rejection) => {
                warn!(engine = %self.name, error = %rejection.error, "rejected message");
                let response = RpcResponse::error(rejection.id, rejection.error);
                self.history
                    .record(Value::String(raw.to_string()), Some(response.to_value()));
                return Some(response.to_string());
            }
        };

        match incoming {
            Incoming::Single(value) => self.process(value).await.map(|r| r.to_string()),
            Incoming::Batch(items) => {
                debug!(engine = %self.name, size = items.len(), "processing batch");
                let mut responses = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(response) = self.process(item).await {
                        responses.push(response.to_value());
                    }
                }
                if responses.is_empty() {
                    None
                } else {
                    Some(Value::Array(responses).to_string())
                }
            }
        }
    }

    async fn process(&self, value: Value) -> Option<RpcResponse> {
        let response = match validate::validate_call(&value) {
            Ok(call) => self.dispatch(call).await,
            Err(rejection) => {
                warn!(engine = %self.name, error = %rejection.error, "invalid request");
                Some(RpcResponse::error(rejection.id, rejection.error))
            }
        };
        self.history
            .record(value, response.as_ref().map(RpcResponse::to_value));
        response
    }

    async fn dispatch(&self, call: Call) -> Option<RpcResponse> {
        let Call { method, params, id } = call;
        let start = Instant::now();

        let handler = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&method)
            .cloned();

        let outcome = match handler {
            Some(handler) => handler
                .call(params)
                .await
                .map_err(HandlerError::into_rpc_error),
            None => Err(RpcError::method_not_found(&method)),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => debug!(engine = %self.name, method = %method, elapsed_ms, "call completed"),
            Err(e) => warn!(engine = %self.name, method = %method, elapsed_ms, error = %e, "call failed"),
        }

        let id = id?;
        Some(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::error(id, error),
        })
    }
}
