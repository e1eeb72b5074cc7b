//! Reload behaviour under concurrent readers and invokers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Map, json};

use switchboard_core::McpServer;
use switchboard_core::registry::{ToolCandidate, ToolRegistry};
use switchboard_test_utils::fixtures::{EchoTool, StaticLoader, StaticTool, candidate};

fn set(prefix: &str) -> Vec<ToolCandidate> {
    (0..4)
        .map(|i| candidate(&format!("{prefix}_{i}"), "prompt", EchoTool::new("prompt")))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_a_mixed_set() {
    let loader = StaticLoader::new(set("alpha"));
    let registry = Arc::new(ToolRegistry::new(loader.clone()));
    registry.load();

    let stop = Arc::new(AtomicBool::new(false));
    let mut readers = Vec::new();
    for _ in 0..4 {
        let registry = Arc::clone(&registry);
        let stop = Arc::clone(&stop);
        readers.push(tokio::spawn(async move {
            let mut observed = 0usize;
            while !stop.load(Ordering::Relaxed) {
                let names = registry.names();
                assert_eq!(names.len(), 4, "partial set: {names:?}");
                let prefix = names[0].split('_').next().unwrap().to_string();
                assert!(
                    names.iter().all(|n| n.starts_with(&prefix)),
                    "mixed set: {names:?}"
                );
                observed += 1;
                tokio::task::yield_now().await;
            }
            observed
        }));
    }

    for round in 0..200 {
        loader.replace(if round % 2 == 0 { set("beta") } else { set("alpha") });
        registry.reload();
        tokio::task::yield_now().await;
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }
}

#[tokio::test]
async fn test_invocation_in_flight_survives_reload() {
    let loader = StaticLoader::new(vec![candidate(
        "slow",
        "prompt",
        StaticTool::delayed(json!("done"), Duration::from_millis(50)),
    )]);
    let registry = Arc::new(ToolRegistry::new(loader.clone()));
    registry.load();

    let invoking = Arc::clone(&registry);
    let call = tokio::spawn(async move { invoking.invoke("slow", Map::new()).await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    loader.replace(Vec::new());
    assert_eq!(registry.reload(), 0);

    let envelope = call.await.unwrap();
    assert_eq!(envelope.into_result().unwrap(), json!("done"));
    assert!(registry.invoke("slow", Map::new()).await.is_error());
}

#[tokio::test]
async fn test_provider_methods_follow_reload() {
    let loader = StaticLoader::new(set("alpha"));
    let registry = Arc::new(ToolRegistry::new(loader.clone()));
    registry.load();
    let server = McpServer::new(registry);

    assert!(server.engine().has_method("alpha_0"));

    loader.replace(set("beta"));
    let reply = server
        .handle(r#"{"jsonrpc":"2.0","method":"mcp.reload_tools","id":1}"#)
        .await
        .unwrap();
    let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(reply["result"], json!({"status": "reloaded", "tool_count": 4}));

    assert!(!server.engine().has_method("alpha_0"));
    assert!(server.engine().has_method("beta_3"));
    assert!(server.engine().has_method("mcp.list_tools"));
}

#[tokio::test]
async fn test_duplicate_and_incomplete_candidates_are_skipped() {
    let mut candidates = set("alpha");
    candidates.push(candidate("alpha_0", "prompt", EchoTool::new("prompt")));
    candidates.push(ToolCandidate::new("fixture").named("nameless_invoker"));
    candidates.push(ToolCandidate::new("fixture").named("  ").described("blank"));

    let registry = ToolRegistry::new(StaticLoader::new(candidates));
    assert_eq!(registry.load(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_provider_reloads_leave_methods_matching_registry() {
    let loader = StaticLoader::new(set("alpha"));
    let registry = Arc::new(ToolRegistry::new(loader.clone()));
    registry.load();
    let server = McpServer::new(Arc::clone(&registry));

    let mut reloaders = Vec::new();
    for worker in 0..4 {
        let loader = Arc::clone(&loader);
        let server = Arc::clone(&server);
        reloaders.push(tokio::spawn(async move {
            for round in 0..50 {
                let prefix = if (worker + round) % 2 == 0 { "beta" } else { "gamma" };
                loader.replace(set(prefix));
                server.reload();
                tokio::task::yield_now().await;
            }
        }));
    }
    for reloader in reloaders {
        reloader.await.unwrap();
    }

    let listed = registry.names();
    let mut exposed: Vec<String> = server
        .engine()
        .method_names()
        .into_iter()
        .filter(|name| !name.starts_with("mcp."))
        .collect();
    exposed.sort();
    assert_eq!(exposed, listed);

    for name in &listed {
        let request = json!({"jsonrpc": "2.0", "method": name, "params": {"prompt": "x"}, "id": 1});
        let reply = server.handle(&request.to_string()).await.unwrap();
        let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(reply["result"], "x", "{name} not callable: {reply}");
    }
}
