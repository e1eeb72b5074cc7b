//! JSON-RPC 2.0 wire types: error codes, error objects, responses and params.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Protocol version string required on every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes plus the implementation-defined server range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    /// Application-level failure (-32000 to -32099).
    ServerError(i64),
}

impl ErrorCode {
    /// Code used for handler application failures.
    pub const SERVER_ERROR: ErrorCode = ErrorCode::ServerError(-32000);

    pub fn code(self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ServerError(code) => code,
        }
    }

    /// Classify a numeric code. Unknown codes fall into the server range.
    pub fn from_code(code: i64) -> Self {
        match code {
            -32700 => ErrorCode::ParseError,
            -32600 => ErrorCode::InvalidRequest,
            -32601 => ErrorCode::MethodNotFound,
            -32602 => ErrorCode::InvalidParams,
            -32603 => ErrorCode::InternalError,
            other => ErrorCode::ServerError(other),
        }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn kind(&self) -> ErrorCode {
        ErrorCode::from_code(self.code)
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::ParseError, format!("Parse error: {detail}"))
    }

    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidRequest, format!("Invalid Request: {detail}"))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("Method not found: {method}"),
        )
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidParams, format!("Invalid params: {detail}"))
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, format!("Internal error: {detail}"))
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SERVER_ERROR, message)
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for RpcError {}

/// Exactly one of result or error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

/// A response to a single (non-notification) request.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    /// Echoed request id, or null when it could not be determined.
    pub id: Value,
    pub outcome: Outcome,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            id,
            outcome: Outcome::Error(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    pub fn to_value(&self) -> Value {
        match &self.outcome {
            Outcome::Result(result) => json!({
                "jsonrpc": JSONRPC_VERSION,
                "result": result,
                "id": self.id,
            }),
            Outcome::Error(error) => json!({
                "jsonrpc": JSONRPC_VERSION,
                "error": error,
                "id": self.id,
            }),
        }
    }

    /// Interpret a decoded response object. Returns `None` when the value
    /// carries neither a result nor an error.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj.get("id").cloned().unwrap_or(Value::Null);
        if let Some(error) = obj.get("error") {
            let error = serde_json::from_value(error.clone()).unwrap_or_else(|_| {
                RpcError::internal(format!("unrecognized error object {error}"))
            });
            return Some(Self::error(id, error));
        }
        obj.get("result")
            .map(|result| Self::success(id, result.clone()))
    }
}

impl std::fmt::Display for RpcResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// Request parameters as received on the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Params {
    /// Bind parameters to a handler's declared names.
    ///
    /// Positional params must supply exactly one value per name. Named params
    /// must supply every name and nothing else.
    pub fn bind(self, names: &[&str]) -> Result<Map<String, Value>, RpcError> {
        match self {
            Params::None => match names.first() {
                None => Ok(Map::new()),
                Some(name) => Err(RpcError::invalid_params(format!(
                    "missing parameter '{name}'"
                ))),
            },
            Params::Positional(values) => {
                if values.len() != names.len() {
                    return Err(RpcError::invalid_params(format!(
                        "expected {} positional parameter(s), got {}",
                        names.len(),
                        values.len()
                    )));
                }
                Ok(names
                    .iter()
                    .map(|n| n.to_string())
                    .zip(values)
                    .collect())
            }
            Params::Named(map) => {
                if let Some(unknown) = map.keys().find(|k| !names.contains(&k.as_str())) {
                    return Err(RpcError::invalid_params(format!(
                        "unexpected parameter '{unknown}'"
                    )));
                }
                if let Some(missing) = names.iter().find(|n| !map.contains_key(**n)) {
                    return Err(RpcError::invalid_params(format!(
                        "missing parameter '{missing}'"
                    )));
                }
                Ok(map)
            }
        }
    }

    /// Collapse into a free-form mapping.
    ///
    /// A single positional object is taken as the mapping itself; any other
    /// positional shape is rejected.
    pub fn into_mapping(self) -> Result<Map<String, Value>, RpcError> {
        match self {
            Params::None => Ok(Map::new()),
            Params::Named(map) => Ok(map),
            Params::Positional(values) => match <[Value; 1]>::try_from(values) {
                Ok([Value::Object(map)]) => Ok(map),
                _ => Err(RpcError::invalid_params(
                    "expected a parameter object".to_string(),
                )),
            },
        }
    }
}

/// Fetch a required string field from bound params.
pub fn require_str<'a>(params: &'a Map<String, Value>, name: &str) -> Result<&'a str, RpcError> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params(format!("'{name}' must be a string")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(ErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(ErrorCode::InvalidParams.code(), -32602);
        assert_eq!(ErrorCode::InternalError.code(), -32603);
        assert_eq!(ErrorCode::SERVER_ERROR.code(), -32000);
        assert_eq!(ErrorCode::from_code(-32050), ErrorCode::ServerError(-32050));
    }

    #[test]
    fn test_success_response_shape() {
        let resp = RpcResponse::success(json!(7), json!({"ok": true}));
        assert_eq!(
            resp.to_value(),
            json!({"jsonrpc": "2.0", "result": {"ok": true}, "id": 7})
        );
    }

    #[test]
    fn test_error_response_omits_absent_data() {
        let resp = RpcResponse::error(Value::Null, RpcError::method_not_found("nope"));
        assert_eq!(
            resp.to_value(),
            json!({
                "jsonrpc": "2.0",
                "error": {"code": -32601, "message": "Method not found: nope"},
                "id": null,
            })
        );
    }

    #[test]
    fn test_null_result_is_preserved() {
        let resp = RpcResponse::success(json!("a"), Value::Null);
        let value = resp.to_value();
        assert!(value.as_object().unwrap().contains_key("result"));
        assert_eq!(RpcResponse::from_value(&value), Some(resp));
    }

    #[test]
    fn test_from_value_reads_error() {
        let value = json!({"jsonrpc": "2.0", "error": {"code": -32602, "message": "bad"}, "id": 1});
        let resp = RpcResponse::from_value(&value).unwrap();
        match resp.outcome {
            Outcome::Error(e) => assert_eq!(e.kind(), ErrorCode::InvalidParams),
            Outcome::Result(_) => panic!("expected error"),
        }
    }

    #[test]
    fn test_bind_named() {
        let params = Params::Named(json!({"message": "hi"}).as_object().unwrap().clone());
        let bound = params.bind(&["message"]).unwrap();
        assert_eq!(bound["message"], "hi");
    }

    #[test]
    fn test_bind_positional() {
        let params = Params::Positional(vec![json!("web_search"), json!({"query": "x"})]);
        let bound = params.bind(&["tool_name", "tool_params"]).unwrap();
        assert_eq!(bound["tool_name"], "web_search");
        assert_eq!(bound["tool_params"], json!({"query": "x"}));
    }

    #[test]
    fn test_bind_rejects_unknown_name() {
        let params = Params::Named(json!({"message": "hi", "extra": 1}).as_object().unwrap().clone());
        let err = params.bind(&["message"]).unwrap_err();
        assert_eq!(err.kind(), ErrorCode::InvalidParams);
        assert!(err.message.contains("extra"));
    }

    #[test]
    fn test_bind_rejects_missing_name() {
        let err = Params::None.bind(&["message"]).unwrap_err();
        assert_eq!(err.kind(), ErrorCode::InvalidParams);
        assert!(err.message.contains("message"));
    }

    #[test]
    fn test_bind_rejects_extra_positional() {
        let params = Params::Positional(vec![json!(1), json!(2)]);
        assert!(params.bind(&["message"]).is_err());
    }

    #[test]
    fn test_bind_empty_accepts_nothing() {
        assert!(Params::None.bind(&[]).unwrap().is_empty());
        assert!(Params::Named(Map::new()).bind(&[]).unwrap().is_empty());
        assert!(Params::Positional(vec![]).bind(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_into_mapping() {
        let single = Params::Positional(vec![json!({"prompt": "p"})]);
        assert_eq!(single.into_mapping().unwrap()["prompt"], "p");
        assert!(Params::Positional(vec![json!("p")]).into_mapping().is_err());
        assert!(Params::None.into_mapping().unwrap().is_empty());
    }
}
