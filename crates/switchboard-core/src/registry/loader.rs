//! Discovery input: candidates produced by a loader.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::tool::{ToolDescriptor, ToolInvoker};

/// A possibly-incomplete capability offered during discovery.
///
/// Candidates missing a name, description or invoker are skipped by the
/// registry rather than failing discovery.
#[derive(Clone)]
pub struct ToolCandidate {
    /// Where the candidate came from, for log messages.
    pub origin: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub parameters: BTreeMap<String, String>,
    pub invoker: Option<Arc<dyn ToolInvoker>>,
}

impl ToolCandidate {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            name: None,
            description: None,
            parameters: BTreeMap::new(),
            invoker: None,
        }
    }

    /// A complete candidate built from a descriptor.
    pub fn from_descriptor(
        origin: impl Into<String>,
        descriptor: ToolDescriptor,
        invoker: Arc<dyn ToolInvoker>,
    ) -> Self {
        Self {
            origin: origin.into(),
            name: Some(descriptor.name),
            description: Some(descriptor.description),
            parameters: descriptor.parameters,
            invoker: Some(invoker),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), description.into());
        self
    }

    pub fn invoker(mut self, invoker: Arc<dyn ToolInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }
}

impl fmt::Debug for ToolCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCandidate")
            .field("origin", &self.origin)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("invoker", &self.invoker.is_some())
            .finish()
    }
}

/// Source of candidates. Called on initial load and on every reload.
pub trait ToolLoader: Send + Sync {
    fn candidates(&self) -> Vec<ToolCandidate>;
}
