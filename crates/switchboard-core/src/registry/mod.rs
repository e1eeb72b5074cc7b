//! Capability registry.
//!
//! The registry holds an immutable [`RegistrySnapshot`] behind an `Arc`.
//! Discovery builds a complete new snapshot and swaps it in with a single
//! write, so a concurrent lookup sees either the old set or the new set and
//! never a partial one.

pub mod loader;
pub mod tool;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::COLLABORATOR_TIMEOUT;
use crate::rpc::{ErrorCode, RpcError};

pub use loader::{ToolCandidate, ToolLoader};
pub use tool::{ProviderError, ToolDescriptor, ToolEnvelope, ToolInvoker, ToolParams};

/// A validated, invocable capability.
#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    invoker: Arc<dyn ToolInvoker>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// An immutable set of registered tools, in discovery order.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    generation: u64,
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl RegistrySnapshot {
    fn new(generation: u64, tools: Vec<RegisteredTool>) -> Self {
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.descriptor.name.clone(), i))
            .collect();
        Self {
            generation,
            tools,
            index,
        }
    }

    /// Monotonic counter, bumped on every load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.descriptor.name.clone()).collect()
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Registry of capability providers with atomic reload.
pub struct ToolRegistry {
    loader: Arc<dyn ToolLoader>,
    current: RwLock<Arc<RegistrySnapshot>>,
    generation: AtomicU64,
    timeout: Duration,
}

impl ToolRegistry {
    /// Create an empty registry. Call [`load`](Self::load) to populate it.
    pub fn new(loader: Arc<dyn ToolLoader>) -> Self {
        Self {
            loader,
            current: RwLock::new(Arc::new(RegistrySnapshot::default())),
            generation: AtomicU64::new(0),
            timeout: COLLABORATOR_TIMEOUT,
        }
    }

    /// Override the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run discovery and install the result. Returns the tool count.
    pub fn load(&self) -> usize {
        let tools = self.discover();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(RegistrySnapshot::new(generation, tools));
        let count = snapshot.len();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        info!(generation, tools = count, "tool registry loaded");
        count
    }

    /// Discard the current set and rediscover. Returns the tool count.
    pub fn reload(&self) -> usize {
        self.load()
    }

    /// The set visible right now. Holding it keeps that set alive across a reload.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.snapshot().descriptors()
    }

    pub fn names(&self) -> Vec<String> {
        self.snapshot().names()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshot().contains(name)
    }

    /// Invoke a tool by name.
    ///
    /// Never fails outward: unknown tools, provider errors, timeouts and
    /// panics all come back as an error envelope.
    pub async fn invoke(&self, name: &str, params: ToolParams) -> ToolEnvelope {
        let snapshot = self.snapshot();
        let Some(tool) = snapshot.get(name) else {
            debug!(tool = name, "invocation of unknown tool");
            return ToolEnvelope::Error(RpcError::new(
                ErrorCode::MethodNotFound,
                format!("Tool not found: '{name}'"),
            ));
        };

        let invoker = Arc::clone(&tool.invoker);
        let mut task = tokio::spawn(async move { invoker.invoke(params).await });

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(Ok(value))) => ToolEnvelope::Result(value),
            Ok(Ok(Err(err))) => {
                warn!(tool = name, error = %err, "tool invocation failed");
                ToolEnvelope::Error(err.into_rpc_error())
            }
            Ok(Err(join_err)) => {
                warn!(tool = name, error = %join_err, "tool invocation panicked");
                ToolEnvelope::Error(RpcError::internal(format!("tool '{name}' crashed")))
            }
            Err(_) => {
                task.abort();
                warn!(tool = name, timeout_secs = self.timeout.as_secs(), "tool invocation timed out");
                ToolEnvelope::Error(
                    ProviderError::Timeout(self.timeout.as_secs()).into_rpc_error(),
                )
            }
        }
    }

    fn discover(&self) -> Vec<RegisteredTool> {
        let mut tools: Vec<RegisteredTool> = Vec::new();
        for candidate in self.loader.candidates() {
            let origin = candidate.origin.clone();
            match validate_candidate(candidate) {
                Ok(tool) if tools.iter().any(|t| t.descriptor.name == tool.descriptor.name) => {
                    warn!(
                        origin = %origin,
                        tool = %tool.descriptor.name,
                        "skipping duplicate tool name"
                    );
                }
                Ok(tool) => {
                    debug!(origin = %origin, tool = %tool.descriptor.name, "tool discovered");
                    tools.push(tool);
                }
                Err(reason) => warn!(origin = %origin, reason, "skipping tool candidate"),
            }
        }
        tools
    }
}

fn validate_candidate(candidate: ToolCandidate) -> Result<RegisteredTool, &'static str> {
    let name = match candidate.name {
        Some(name) if !name.trim().is_empty() => name,
        Some(_) => return Err("empty name"),
        None => return Err("missing name"),
    };
    let description = candidate.description.ok_or("missing description")?;
    let invoker = candidate.invoker.ok_or("missing invoker")?;
    Ok(RegisteredTool {
        descriptor: ToolDescriptor {
            name,
            description,
            parameters: candidate.parameters,
        },
        invoker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Fixed(Mutex<Vec<ToolCandidate>>);

    impl ToolLoader for Fixed {
        fn candidates(&self) -> Vec<ToolCandidate> {
            self.0.lock().unwrap().clone()
        }
    }

    fn upper() -> Arc<dyn ToolInvoker> {
        Arc::new(|params: ToolParams| async move {
            let text = params
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| ProviderError::MissingParameter("text".into()))?;
            Ok::<_, ProviderError>(json!(text.to_uppercase()))
        })
    }

    fn candidate(name: &str) -> ToolCandidate {
        ToolCandidate::new("test")
            .named(name)
            .described(format!("{name} tool"))
            .parameter("text", "input")
            .invoker(upper())
    }

    fn registry(candidates: Vec<ToolCandidate>) -> (Arc<Fixed>, ToolRegistry) {
        let loader = Arc::new(Fixed(Mutex::new(candidates)));
        let registry = ToolRegistry::new(loader.clone());
        registry.load();
        (loader, registry)
    }

    #[test]
    fn test_skips_incomplete_candidates() {
        let (_, registry) = registry(vec![
            candidate("good"),
            ToolCandidate::new("no-name").described("d").invoker(upper()),
            candidate("  "),
            ToolCandidate::new("no-invoker").named("lazy").described("d"),
            ToolCandidate::new("no-description").named("terse").invoker(upper()),
        ]);
        assert_eq!(registry.names(), vec!["good"]);
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let (_, registry) = registry(vec![
            candidate("dup"),
            candidate("dup").described("second"),
        ]);
        let list = registry.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].description, "dup tool");
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let (_, registry) = registry(vec![candidate("upper")]);
        let mut params = ToolParams::new();
        params.insert("text".into(), json!("abc"));
        assert_eq!(
            registry.invoke("upper", params).await,
            ToolEnvelope::Result(json!("ABC"))
        );
    }

    #[tokio::test]
    async fn test_invoke_missing_param_is_envelope() {
        let (_, registry) = registry(vec![candidate("upper")]);
        match registry.invoke("upper", ToolParams::new()).await {
            ToolEnvelope::Error(e) => {
                assert_eq!(e.kind(), ErrorCode::InvalidParams);
                assert!(e.message.contains("text"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let (_, registry) = registry(vec![]);
        match registry.invoke("ghost", ToolParams::new()).await {
            ToolEnvelope::Error(e) => assert_eq!(e.kind(), ErrorCode::MethodNotFound),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_panic_is_contained() {
        let panicky: Arc<dyn ToolInvoker> = Arc::new(|_params: ToolParams| async move {
            if true {
                panic!("provider bug");
            }
            Ok::<Value, ProviderError>(Value::Null)
        });
        let (_, registry) = registry(vec![
            ToolCandidate::new("t").named("bad").described("d").invoker(panicky),
        ]);
        match registry.invoke("bad", ToolParams::new()).await {
            ToolEnvelope::Error(e) => assert_eq!(e.kind(), ErrorCode::InternalError),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_timeout() {
        let slow: Arc<dyn ToolInvoker> = Arc::new(|_params: ToolParams| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<Value, ProviderError>(Value::Null)
        });
        let loader = Arc::new(Fixed(Mutex::new(vec![
            ToolCandidate::new("t").named("slow").described("d").invoker(slow),
        ])));
        let registry = ToolRegistry::new(loader).with_timeout(Duration::from_millis(20));
        registry.load();
        match registry.invoke("slow", ToolParams::new()).await {
            ToolEnvelope::Error(e) => assert!(e.message.contains("timed out")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timed_out_invocation_is_cancelled() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let slow: Arc<dyn ToolInvoker> = Arc::new(move |_params: ToolParams| {
            let flag = Arc::clone(&flag);
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                flag.store(true, Ordering::SeqCst);
                Ok::<Value, ProviderError>(Value::Null)
            }
        });
        let loader = Arc::new(Fixed(Mutex::new(vec![
            ToolCandidate::new("t").named("slow").described("d").invoker(slow),
        ])));
        let registry = ToolRegistry::new(loader).with_timeout(Duration::from_millis(20));
        registry.load();

        assert!(registry.invoke("slow", ToolParams::new()).await.is_error());
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_reload_replaces_set() {
        let (loader, registry) = registry(vec![candidate("a"), candidate("b")]);
        let before = registry.snapshot();

        *loader.0.lock().unwrap() = vec![candidate("c")];
        assert_eq!(registry.reload(), 1);

        assert_eq!(registry.names(), vec!["c"]);
        // A snapshot taken before the reload still sees the old set.
        assert_eq!(before.names(), vec!["a", "b"]);
        assert!(registry.snapshot().generation() > before.generation());
    }
}
