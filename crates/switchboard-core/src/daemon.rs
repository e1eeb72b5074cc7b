//! Daemon runtime: service wiring, startup and shutdown.
//!
//! ```text
//! llm ─▶ BuiltinLoader ─▶ ToolRegistry ─▶ McpServer ─▶ McpClient
//!                                                          │
//!                       user RpcEngine ◀── Agent ◀── Router┘
//! ```

use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use switchboard_config::AppConfig;

use crate::agent::{Agent, register_methods};
use crate::logging::LogReader;
use crate::mcp::{McpClient, McpServer};
use crate::registry::ToolRegistry;
use crate::routing::{LlmReasoner, Router};
use crate::rpc::RpcEngine;
use crate::server::{self, AppState};
use crate::tools::BuiltinLoader;

/// Shutdown signal sent via broadcast channel.
#[derive(Debug, Clone)]
pub struct ShutdownSignal;

/// The wired service graph.
pub struct Services {
    pub registry: Arc<ToolRegistry>,
    pub mcp: Arc<McpServer>,
    pub agent: Arc<Agent>,
    /// Engine exposing the `agent.*` methods.
    pub user: Arc<RpcEngine>,
}

/// The main Switchboard daemon.
pub struct Daemon {
    config: AppConfig,
    logs: Option<LogReader>,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
}

impl Daemon {
    /// Create a new daemon instance with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            logs: None,
            shutdown_tx,
        }
    }

    /// Serve captured logs at `GET /logs`.
    pub fn with_log_reader(mut self, logs: LogReader) -> Self {
        self.logs = Some(logs);
        self
    }

    /// Build the registry, provider engine, agent and user engine.
    ///
    /// The registry is loaded before this returns.
    pub fn build_services(&self) -> Services {
        let llm = crate::llm::create_provider(&self.config.llm);

        let loader = BuiltinLoader::new(self.config.tools.clone(), Arc::clone(&llm));
        let registry = Arc::new(ToolRegistry::new(Arc::new(loader)));
        registry.load();

        let mcp = McpServer::new(Arc::clone(&registry));
        let client = match &self.config.server.mcp_url {
            Some(url) => {
                info!(url = %url, "reaching providers over HTTP");
                McpClient::http(url.clone())
            }
            None => McpClient::local(Arc::clone(&mcp)),
        };

        let routing = &self.config.routing;
        let mut router = Router::new(routing.clone());
        if routing.reasoner.enabled {
            info!(model = %routing.reasoner.model, "reasoner enabled");
            router = router.with_reasoner(Arc::new(LlmReasoner::new(
                llm,
                routing.reasoner.model.clone(),
            )));
        }

        let agent = Arc::new(Agent::new(Arc::new(client), router));
        let user = Arc::new(RpcEngine::new("user"));
        register_methods(&user, Arc::clone(&agent));

        Services {
            registry,
            mcp,
            agent,
            user,
        }
    }

    /// Run the daemon until Ctrl-C or [`shutdown`](Self::shutdown).
    pub async fn run(&self) -> Result<(), DaemonError> {
        let shutdown_rx = self.shutdown_tx.subscribe();
        let addr = self.config.server.socket_addr();
        info!(addr = %addr, version = %crate::build_info::version_string(), "Switchboard daemon starting");

        let services = self.build_services();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| DaemonError::Bind { addr, source: e })?;

        let state = Arc::new(AppState {
            user: services.user,
            mcp: services.mcp,
            logs: self.logs.clone(),
            started_at: Instant::now(),
        });

        let ctrl_c_tx = self.shutdown_tx.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, initiating graceful shutdown");
                let _ = ctrl_c_tx.send(ShutdownSignal);
            }
        });

        let result = server::serve(listener, state, shutdown_rx).await;
        ctrl_c.abort();
        result?;

        info!("Daemon stopped");
        Ok(())
    }

    /// Request a graceful shutdown of the daemon.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(ShutdownSignal);
    }

    /// Get a reference to the daemon's configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Errors from the daemon runtime.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
