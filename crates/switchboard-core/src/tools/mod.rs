//! Built-in capability providers and the loader that offers them.

pub mod generation;
pub mod web_search;

use std::sync::Arc;

use switchboard_config::ToolsConfig;

use crate::llm::LlmProvider;
use crate::registry::{ToolCandidate, ToolLoader};

pub use generation::{GenerationKind, GenerationTool};
pub use web_search::WebSearchTool;

/// Offers the built-in tools named in `[tools] enabled`.
///
/// Unknown names are offered without an invoker so the registry logs and
/// skips them.
pub struct BuiltinLoader {
    config: ToolsConfig,
    llm: Arc<dyn LlmProvider>,
}

impl BuiltinLoader {
    pub fn new(config: ToolsConfig, llm: Arc<dyn LlmProvider>) -> Self {
        Self { config, llm }
    }

    fn candidate(&self, name: &str) -> ToolCandidate {
        let origin = format!("builtin:{name}");
        match name {
            "text_generation" => ToolCandidate::from_descriptor(
                origin,
                GenerationKind::Text.descriptor(),
                Arc::new(GenerationTool::new(
                    GenerationKind::Text,
                    Arc::clone(&self.llm),
                    self.config.text_generation.clone(),
                )),
            ),
            "code_generation" => ToolCandidate::from_descriptor(
                origin,
                GenerationKind::Code.descriptor(),
                Arc::new(GenerationTool::new(
                    GenerationKind::Code,
                    Arc::clone(&self.llm),
                    self.config.code_generation.clone(),
                )),
            ),
            web_search::TOOL_NAME => ToolCandidate::from_descriptor(
                origin,
                web_search::descriptor(),
                Arc::new(WebSearchTool::new(&self.config.web_search)),
            ),
            other => ToolCandidate::new(origin).named(other),
        }
    }
}

impl ToolLoader for BuiltinLoader {
    fn candidates(&self) -> Vec<ToolCandidate> {
        self.config
            .enabled
            .iter()
            .map(|name| self.candidate(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::create_provider;
    use crate::registry::ToolRegistry;
    use switchboard_config::LlmConfig;

    fn loader(enabled: &[&str]) -> BuiltinLoader {
        let config = ToolsConfig {
            enabled: enabled.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        BuiltinLoader::new(config, create_provider(&LlmConfig::default()))
    }

    #[test]
    fn test_all_builtins_register() {
        let registry = ToolRegistry::new(Arc::new(loader(&[
            "text_generation",
            "code_generation",
            "web_search",
        ])));
        assert_eq!(registry.load(), 3);
        assert_eq!(
            registry.names(),
            vec!["text_generation", "code_generation", "web_search"]
        );
    }

    #[test]
    fn test_unknown_builtin_is_skipped() {
        let registry = ToolRegistry::new(Arc::new(loader(&["web_search", "teleport"])));
        assert_eq!(registry.load(), 1);
    }

    #[test]
    fn test_descriptor_parameters() {
        let candidates = loader(&["web_search"]).candidates();
        assert!(candidates[0].parameters.contains_key("query"));
    }
}
