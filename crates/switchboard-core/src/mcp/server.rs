//! Provider-facing engine: exposes the registry over JSON-RPC.
//!
//! Methods:
//! - `mcp.list_tools`: `{"tools": [...]}`, descriptors of every registered tool
//! - `mcp.reload_tools`: rediscover, returns `{"status": "reloaded", "tool_count": n}`
//! - `<tool name>`: invoke that tool with the request params as its mapping

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::BoxFuture;
use crate::registry::{ToolEnvelope, ToolRegistry};
use crate::rpc::{Handler, HandlerError, Params, RpcEngine};

pub const LIST_TOOLS: &str = "mcp.list_tools";
pub const RELOAD_TOOLS: &str = "mcp.reload_tools";

/// JSON-RPC front for a [`ToolRegistry`].
pub struct McpServer {
    engine: RpcEngine,
    registry: Arc<ToolRegistry>,
    /// Tool methods currently registered on `engine`. Held across a whole
    /// reload so the method table always matches the installed snapshot.
    tool_methods: Mutex<BTreeSet<String>>,
}

impl McpServer {
    /// Build the server and register methods for the registry's current tools.
    pub fn new(registry: Arc<ToolRegistry>) -> Arc<Self> {
        let server = Arc::new(Self {
            engine: RpcEngine::new("mcp"),
            registry: Arc::clone(&registry),
            tool_methods: Mutex::new(BTreeSet::new()),
        });

        let list_registry = Arc::clone(&registry);
        server.engine.register(LIST_TOOLS, move |params: Params| {
            let registry = Arc::clone(&list_registry);
            async move {
                params.bind(&[])?;
                let tools = serde_json::to_value(registry.list())
                    .map_err(|e| HandlerError::Internal(e.to_string()))?;
                Ok::<_, HandlerError>(json!({ "tools": tools }))
            }
        });

        let weak: Weak<McpServer> = Arc::downgrade(&server);
        server.engine.register(RELOAD_TOOLS, move |params: Params| {
            let weak = weak.clone();
            async move {
                params.bind(&[])?;
                let server = weak
                    .upgrade()
                    .ok_or_else(|| HandlerError::Internal("provider engine shut down".to_string()))?;
                let count = server.reload();
                Ok::<_, HandlerError>(json!({"status": "reloaded", "tool_count": count}))
            }
        });

        {
            let mut registered = server.lock_tool_methods();
            server.sync_tool_methods(&mut registered);
        }
        server
    }

    pub fn engine(&self) -> &RpcEngine {
        &self.engine
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Process one raw message.
    pub async fn handle(&self, raw: &str) -> Option<String> {
        self.engine.handle(raw).await
    }

    /// Rediscover tools and re-sync tool methods. Returns the tool count.
    pub fn reload(&self) -> usize {
        let mut registered = self.lock_tool_methods();
        let count = self.registry.reload();
        self.sync_tool_methods(&mut registered);
        drop(registered);
        info!(tools = count, "provider engine reloaded");
        count
    }

    fn lock_tool_methods(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.tool_methods
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn sync_tool_methods(&self, registered: &mut BTreeSet<String>) {
        let current: BTreeSet<String> = self
            .registry
            .names()
            .into_iter()
            .filter(|name| {
                let reserved = name == LIST_TOOLS || name == RELOAD_TOOLS;
                if reserved {
                    debug!(tool = %name, "tool name shadows a built-in method; not exposed");
                }
                !reserved
            })
            .collect();

        for stale in registered.difference(&current) {
            self.engine.unregister(stale);
        }
        for name in current.difference(registered) {
            self.engine.register(
                name.clone(),
                ToolMethod {
                    tool: name.clone(),
                    registry: Arc::clone(&self.registry),
                },
            );
        }
        *registered = current;
    }
}

/// Method handler that forwards to one tool.
struct ToolMethod {
    tool: String,
    registry: Arc<ToolRegistry>,
}

impl Handler for ToolMethod {
    fn call(&self, params: Params) -> BoxFuture<'_, Result<Value, HandlerError>> {
        Box::pin(async move {
            let params = params.into_mapping()?;
            match self.registry.invoke(&self.tool, params).await {
                ToolEnvelope::Result(value) => Ok(value),
                ToolEnvelope::Error(err) => Err(HandlerError::Rpc(err)),
            }
        })
    }
}
