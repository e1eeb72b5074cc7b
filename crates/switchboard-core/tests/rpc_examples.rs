//! Wire-level behaviour of the user-facing engine with the agent methods
//! registered.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use switchboard_config::RoutingConfig;
use switchboard_core::agent::register_methods;
use switchboard_core::registry::ToolRegistry;
use switchboard_core::routing::{ReasonerError, Router};
use switchboard_core::{Agent, McpClient, McpServer, RpcEngine};
use switchboard_test_utils::fixtures::{EchoTool, ScriptedReasoner, StaticLoader, candidate};

fn user_engine(router: Router) -> RpcEngine {
    let loader = StaticLoader::new(vec![
        candidate("text_generation", "prompt", EchoTool::new("prompt")),
        candidate("code_generation", "prompt", EchoTool::new("prompt")),
    ]);
    let registry = Arc::new(ToolRegistry::new(loader));
    registry.load();
    let client = McpClient::local(McpServer::new(registry));
    let agent = Arc::new(Agent::new(Arc::new(client), router));

    let engine = RpcEngine::new("user");
    register_methods(&engine, agent);
    engine
}

async fn call(engine: &RpcEngine, request: Value) -> Value {
    let raw = engine
        .handle(&request.to_string())
        .await
        .expect("expected a response");
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn test_chat_greeting() {
    let engine = user_engine(Router::new(RoutingConfig::default()));
    let response = call(
        &engine,
        json!({"jsonrpc": "2.0", "method": "agent.chat", "params": {"message": "hi"}, "id": 1}),
    )
    .await;

    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["metadata"]["tool_used"], "conversational");
    assert_eq!(response["result"]["metadata"]["confidence"], 100);
}

#[tokio::test]
async fn test_chat_code_request() {
    let engine = user_engine(Router::new(RoutingConfig::default()));
    let response = call(
        &engine,
        json!({
            "jsonrpc": "2.0",
            "method": "agent.chat",
            "params": ["Write code to reverse a string"],
            "id": "c1"
        }),
    )
    .await;

    assert_eq!(response["id"], "c1");
    assert_eq!(response["result"]["metadata"]["tool_used"], "code_generation");
    assert_eq!(response["result"]["response"], "Write code to reverse a string");
}

#[tokio::test]
async fn test_notification_batch_returns_nothing() {
    let engine = user_engine(Router::new(RoutingConfig::default()));
    let reply = engine.handle(r#"[{"jsonrpc":"2.0","method":"x"}]"#).await;
    assert_eq!(reply, None);
    assert_eq!(engine.history().len(), 1);
}

#[tokio::test]
async fn test_unknown_method() {
    let engine = user_engine(Router::new(RoutingConfig::default()));
    let response = call(&engine, json!({"jsonrpc": "2.0", "method": "foo.bar", "id": 5})).await;

    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(response["id"], 5);
}

#[tokio::test]
async fn test_reasoner_failure_never_reaches_caller() {
    let reasoner = ScriptedReasoner::new(vec![Err(ReasonerError::Timeout(30))]);
    let router = Router::new(RoutingConfig::default()).with_reasoner(reasoner);
    let engine = user_engine(router);

    let response = call(
        &engine,
        json!({
            "jsonrpc": "2.0",
            "method": "agent.chat",
            "params": {"message": "explain the actor model"},
            "id": 9
        }),
    )
    .await;

    assert!(response.get("error").is_none());
    let metadata = &response["result"]["metadata"];
    assert_eq!(metadata["tool_used"], "text_generation");
    assert_eq!(metadata["strategy"], "keyword");
    assert!(metadata["confidence"].as_u64().unwrap() <= 100);
}

#[tokio::test]
async fn test_chat_param_errors() {
    let engine = user_engine(Router::new(RoutingConfig::default()));

    let missing = call(
        &engine,
        json!({"jsonrpc": "2.0", "method": "agent.chat", "params": {}, "id": 1}),
    )
    .await;
    assert_eq!(missing["error"]["code"], -32602);

    let extra = call(
        &engine,
        json!({"jsonrpc": "2.0", "method": "agent.chat", "params": ["a", "b"], "id": 2}),
    )
    .await;
    assert_eq!(extra["error"]["code"], -32602);

    let wrong_type = call(
        &engine,
        json!({
            "jsonrpc": "2.0",
            "method": "agent.execute_tool",
            "params": {"tool_name": "text_generation", "tool_params": "prompt"},
            "id": 3
        }),
    )
    .await;
    assert_eq!(wrong_type["error"]["code"], -32602);
}

#[tokio::test]
async fn test_execute_tool_returns_envelope() {
    let engine = user_engine(Router::new(RoutingConfig::default()));

    let ok = call(
        &engine,
        json!({
            "jsonrpc": "2.0",
            "method": "agent.execute_tool",
            "params": {"tool_name": "text_generation", "tool_params": {"prompt": "hello"}},
            "id": 1
        }),
    )
    .await;
    assert_eq!(ok["result"], json!({"result": "hello"}));

    let missing = call(
        &engine,
        json!({
            "jsonrpc": "2.0",
            "method": "agent.execute_tool",
            "params": ["web_search", {"query": "rust"}],
            "id": 2
        }),
    )
    .await;
    assert_eq!(missing["result"]["error"]["code"], -32601);
}

#[tokio::test]
async fn test_list_capabilities() {
    let engine = user_engine(Router::new(RoutingConfig::default()));
    let response = call(
        &engine,
        json!({"jsonrpc": "2.0", "method": "agent.list_capabilities", "id": 1}),
    )
    .await;

    let names: Vec<&str> = response["result"]["capabilities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["text_generation", "code_generation"]);
}
