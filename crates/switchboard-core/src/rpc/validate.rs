//! Message decoding and request validation.
//!
//! These functions are pure and synchronous so they can be exercised by the
//! fuzz targets without a runtime.

use serde_json::Value;

use super::types::{JSONRPC_VERSION, Params, RpcError};

/// A decoded message: one request value or a non-empty batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Single(Value),
    Batch(Vec<Value>),
}

/// A structurally valid request.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub params: Params,
    /// `None` marks a notification.
    pub id: Option<Value>,
}

impl Call {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// A request that failed validation, with the id to echo back.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub id: Value,
    pub error: RpcError,
}

impl Rejection {
    fn anonymous(error: RpcError) -> Self {
        Self {
            id: Value::Null,
            error,
        }
    }
}

/// Decode raw text into a single request value or a batch.
pub fn parse_message(raw: &str) -> Result<Incoming, Rejection> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| Rejection::anonymous(RpcError::parse_error(e)))?;

    match value {
        Value::Array(items) if items.is_empty() => Err(Rejection::anonymous(
            RpcError::invalid_request("empty batch"),
        )),
        Value::Array(items) => Ok(Incoming::Batch(items)),
        Value::Object(_) => Ok(Incoming::Single(value)),
        _ => Err(Rejection::anonymous(RpcError::invalid_request(
            "expected an object or an array",
        ))),
    }
}

/// Validate one request value.
///
/// The id is echoed on rejection only when it is itself valid (a string or
/// a number); otherwise the rejection carries a null id.
pub fn validate_call(value: &Value) -> Result<Call, Rejection> {
    let Some(obj) = value.as_object() else {
        return Err(Rejection::anonymous(RpcError::invalid_request(
            "request must be an object",
        )));
    };

    let raw_id = obj.get("id");
    let echo_id = match raw_id {
        Some(id @ (Value::String(_) | Value::Number(_))) => id.clone(),
        _ => Value::Null,
    };
    let reject = |detail: &str| Rejection {
        id: echo_id.clone(),
        error: RpcError::invalid_request(detail),
    };

    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(reject("'jsonrpc' must be exactly \"2.0\""));
    }

    let method = match obj.get("method") {
        Some(Value::String(m)) => m.clone(),
        _ => return Err(reject("'method' must be a string")),
    };

    let params = match obj.get("params") {
        None => Params::None,
        Some(Value::Array(values)) => Params::Positional(values.clone()),
        Some(Value::Object(map)) => Params::Named(map.clone()),
        Some(_) => return Err(reject("'params' must be an array or an object")),
    };

    let id = match raw_id {
        None => None,
        Some(Value::String(_) | Value::Number(_)) => Some(echo_id.clone()),
        Some(_) => return Err(reject("'id' must be a string or a number")),
    };

    Ok(Call { method, params, id })
}
