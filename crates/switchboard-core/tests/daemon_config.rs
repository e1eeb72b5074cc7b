//! Daemon wiring driven by config files.

use pretty_assertions::assert_eq;

use switchboard_core::agent::methods;
use switchboard_test_utils::config::TestConfigBuilder;
use switchboard_test_utils::daemon::TestDaemon;
use switchboard_test_utils::tracing_setup::{capture_logs, init_test_tracing};

#[tokio::test]
async fn test_enabled_tools_limit_the_registry() {
    init_test_tracing();
    let test = TestDaemon::with_toml(
        r#"
        [tools]
        enabled = ["text_generation", "web_search"]

        [routing]
        fallback_tool = "text_generation"
        "#,
    )
    .await;

    let services = test.daemon.build_services();
    assert_eq!(services.registry.names(), vec!["text_generation", "web_search"]);
    assert!(!services.mcp.engine().has_method("code_generation"));
    assert!(services.user.has_method(methods::CHAT));
}

#[tokio::test]
async fn test_default_config_file() {
    let test = TestDaemon::default_config().await;
    assert!(test.config_path.ends_with("switchboard.toml"));
    assert_eq!(test.daemon.config().server.listen_port, 5000);
    assert_eq!(test.daemon.build_services().registry.names().len(), 3);
}

#[tokio::test]
async fn test_offline_routing_uses_configured_profiles() {
    let config = TestConfigBuilder::new()
        .enabled_tools(&["text_generation", "code_generation"])
        .build();
    let router = switchboard_core::Router::new(config.routing.clone());
    let mut status = switchboard_core::status::StatusLog::new();
    let route = router
        .route("implement a binary search function", &config.tools.enabled, &mut status)
        .await;
    match route {
        switchboard_core::routing::Route::Tool(decision) => {
            assert_eq!(decision.tool, "code_generation")
        }
        other => panic!("unexpected route {other:?}"),
    }
    assert!(!status.events().is_empty());
}

#[tokio::test]
async fn test_builder_config_round_trips_through_file() {
    let test = TestDaemon::with_builder(
        TestConfigBuilder::new()
            .listen_port(5050)
            .enabled_tools(&["code_generation"])
            .fallback_tool("code_generation"),
    )
    .await;
    assert_eq!(test.daemon.config().server.listen_port, 5050);
    assert_eq!(test.daemon.config().routing.fallback_tool, "code_generation");

    let (logs, _guard) = capture_logs(16);
    let services = test.services();
    assert_eq!(services.registry.names(), vec!["code_generation"]);

    let loaded = logs.tail(16, Some(tracing::Level::INFO));
    assert!(
        loaded
            .iter()
            .any(|e| e.message == "tool registry loaded" && e.fields.get("tools").is_some_and(|n| n == "1"))
    );
}
