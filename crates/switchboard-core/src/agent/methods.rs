//! `agent.*` methods on the user-facing engine.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};

use crate::rpc::{HandlerError, Params, RpcEngine, RpcError, require_str};

use super::Agent;

pub const CHAT: &str = "agent.chat";
pub const EXECUTE_TOOL: &str = "agent.execute_tool";
pub const LIST_CAPABILITIES: &str = "agent.list_capabilities";
pub const REFRESH_CAPABILITIES: &str = "agent.refresh_capabilities";

fn to_json(value: &impl Serialize) -> Result<Value, HandlerError> {
    serde_json::to_value(value).map_err(|e| HandlerError::Internal(e.to_string()))
}

/// Register the agent's methods on `engine`.
pub fn register_methods(engine: &RpcEngine, agent: Arc<Agent>) {
    let chat_agent = Arc::clone(&agent);
    engine.register(CHAT, move |params: Params| {
        let agent = Arc::clone(&chat_agent);
        async move {
            let bound = params.bind(&["message"])?;
            let message = require_str(&bound, "message")?;
            to_json(&agent.chat(message).await)
        }
    });

    let exec_agent = Arc::clone(&agent);
    engine.register(EXECUTE_TOOL, move |params: Params| {
        let agent = Arc::clone(&exec_agent);
        async move {
            let mut bound = params.bind(&["tool_name", "tool_params"])?;
            let tool_params = match bound.remove("tool_params") {
                Some(Value::Object(map)) => map,
                _ => {
                    return Err(RpcError::invalid_params("'tool_params' must be an object").into());
                }
            };
            let name = require_str(&bound, "tool_name")?;
            to_json(&agent.execute_tool(name, tool_params).await)
        }
    });

    let list_agent = Arc::clone(&agent);
    engine.register(LIST_CAPABILITIES, move |params: Params| {
        let agent = Arc::clone(&list_agent);
        async move {
            params.bind(&[])?;
            let tools = agent.list_capabilities().await?;
            Ok::<_, HandlerError>(json!({ "capabilities": tools }))
        }
    });

    let refresh_agent = agent;
    engine.register(REFRESH_CAPABILITIES, move |params: Params| {
        let agent = Arc::clone(&refresh_agent);
        async move {
            params.bind(&[])?;
            let tools = agent.refresh_capabilities().await?;
            Ok::<_, HandlerError>(json!({ "capabilities": tools }))
        }
    });
}
