//! Tool descriptors, the invocation trait, and the result envelope.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::BoxFuture;
use crate::rpc::{ErrorCode, RpcError};

/// Parameters passed to a tool: a mapping from names to values.
pub type ToolParams = Map<String, Value>;

/// Name used when a descriptor declares no parameters.
pub const DEFAULT_PRIMARY_PARAMETER: &str = "prompt";

/// Public description of a registered capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// Parameter name to human-readable description.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), description.into());
        self
    }

    /// The parameter that carries the user's message.
    ///
    /// A sole declared parameter is primary. With several, `prompt` wins if
    /// declared, else the first name in order.
    pub fn primary_parameter(&self) -> &str {
        if self.parameters.len() == 1 || !self.parameters.contains_key(DEFAULT_PRIMARY_PARAMETER) {
            if let Some(name) = self.parameters.keys().next() {
                return name;
            }
        }
        DEFAULT_PRIMARY_PARAMETER
    }
}

/// Errors raised by a capability provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("'{0}' parameter is required")]
    MissingParameter(String),

    #[error("{0}")]
    Upstream(String),

    #[error("timed out after {0}s")]
    Timeout(u64),
}

impl ProviderError {
    /// Convert into the envelope error the registry hands back to callers.
    pub fn into_rpc_error(self) -> RpcError {
        match self {
            ProviderError::MissingParameter(_) => RpcError::new(ErrorCode::InvalidParams, self.to_string()),
            other => RpcError::server(other.to_string()),
        }
    }
}

/// Executes a capability.
///
/// Implemented for any `Fn(ToolParams) -> impl Future` closure.
pub trait ToolInvoker: Send + Sync {
    fn invoke(&self, params: ToolParams) -> BoxFuture<'_, Result<Value, ProviderError>>;
}

impl<F, Fut> ToolInvoker for F
where
    F: Fn(ToolParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ProviderError>> + Send + 'static,
{
    fn invoke(&self, params: ToolParams) -> BoxFuture<'_, Result<Value, ProviderError>> {
        Box::pin(self(params))
    }
}

/// Outcome of a tool invocation: `{"result": ...}` or `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolEnvelope {
    Result(Value),
    Error(RpcError),
}

impl ToolEnvelope {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolEnvelope::Error(_))
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self {
            ToolEnvelope::Result(value) => Ok(value),
            ToolEnvelope::Error(err) => Err(err),
        }
    }
}

impl From<Result<Value, RpcError>> for ToolEnvelope {
    fn from(result: Result<Value, RpcError>) -> Self {
        match result {
            Ok(value) => ToolEnvelope::Result(value),
            Err(err) => ToolEnvelope::Error(err),
        }
    }
}
