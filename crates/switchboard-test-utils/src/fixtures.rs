//! Stub tools, loaders and reasoners.
//!
//! These stand in for the built-in providers and the LLM reasoner so that
//! routing and agent tests run without network access.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;

use switchboard_core::BoxFuture;
use switchboard_core::registry::{
    ProviderError, ToolCandidate, ToolDescriptor, ToolInvoker, ToolLoader, ToolParams,
};
use switchboard_core::routing::{Reasoner, ReasonerError};

/// Returns the string value of one parameter, recording every call.
pub struct EchoTool {
    param: String,
    calls: Mutex<Vec<ToolParams>>,
}

impl EchoTool {
    pub fn new(param: &str) -> Arc<Self> {
        Arc::new(Self {
            param: param.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Parameters of every call so far, oldest first.
    pub fn calls(&self) -> Vec<ToolParams> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ToolInvoker for EchoTool {
    fn invoke(&self, params: ToolParams) -> BoxFuture<'_, Result<Value, ProviderError>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(params.clone());
            match params.get(&self.param).and_then(Value::as_str) {
                Some(text) => Ok(Value::String(text.to_string())),
                None => Err(ProviderError::MissingParameter(self.param.clone())),
            }
        })
    }
}

/// Always fails with an upstream error.
pub struct FailingTool {
    message: String,
}

impl FailingTool {
    pub fn new(message: &str) -> Arc<Self> {
        Arc::new(Self {
            message: message.to_string(),
        })
    }
}

impl ToolInvoker for FailingTool {
    fn invoke(&self, _params: ToolParams) -> BoxFuture<'_, Result<Value, ProviderError>> {
        Box::pin(async move { Err(ProviderError::Upstream(self.message.clone())) })
    }
}

/// Always returns the same value, optionally after a delay.
pub struct StaticTool {
    output: Value,
    delay: Duration,
}

impl StaticTool {
    pub fn new(output: Value) -> Arc<Self> {
        Arc::new(Self {
            output,
            delay: Duration::ZERO,
        })
    }

    pub fn delayed(output: Value, delay: Duration) -> Arc<Self> {
        Arc::new(Self { output, delay })
    }
}

impl ToolInvoker for StaticTool {
    fn invoke(&self, _params: ToolParams) -> BoxFuture<'_, Result<Value, ProviderError>> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.output.clone())
        })
    }
}

/// A complete candidate with a single declared parameter.
pub fn candidate(name: &str, param: &str, invoker: Arc<dyn ToolInvoker>) -> ToolCandidate {
    let descriptor =
        ToolDescriptor::new(name, format!("{name} tool")).with_parameter(param, "input");
    ToolCandidate::from_descriptor("fixture", descriptor, invoker)
}

/// Loader over a replaceable candidate list.
pub struct StaticLoader {
    candidates: Mutex<Vec<ToolCandidate>>,
}

impl StaticLoader {
    pub fn new(candidates: Vec<ToolCandidate>) -> Arc<Self> {
        Arc::new(Self {
            candidates: Mutex::new(candidates),
        })
    }

    /// Swap the candidates the next discovery will see.
    pub fn replace(&self, candidates: Vec<ToolCandidate>) {
        *self
            .candidates
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = candidates;
    }
}

impl ToolLoader for StaticLoader {
    fn candidates(&self) -> Vec<ToolCandidate> {
        self.candidates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Replays a fixed sequence of reasoner outputs.
///
/// Once the script runs out every call fails with [`ReasonerError::Call`].
pub struct ScriptedReasoner {
    script: Mutex<VecDeque<Result<Value, ReasonerError>>>,
    offered: Mutex<Vec<Vec<String>>>,
}

impl ScriptedReasoner {
    pub fn new(script: Vec<Result<Value, ReasonerError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            offered: Mutex::new(Vec::new()),
        })
    }

    /// A reasoner that answers a single call with `output`.
    pub fn once(output: Value) -> Arc<Self> {
        Self::new(vec![Ok(output)])
    }

    /// Tool lists offered on each call.
    pub fn offered(&self) -> Vec<Vec<String>> {
        self.offered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Reasoner for ScriptedReasoner {
    fn classify<'a>(
        &'a self,
        _message: &'a str,
        tools: &'a [String],
    ) -> BoxFuture<'a, Result<Value, ReasonerError>> {
        Box::pin(async move {
            self.offered
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(tools.to_vec());
            self.script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or_else(|| Err(ReasonerError::Call("script exhausted".to_string())))
        })
    }
}
