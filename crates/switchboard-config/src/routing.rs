//! Routing configuration: keyword profiles and tool roles.
//!
//! Each [`KeywordProfile`] gives one tool a keyword set and an integer
//! weight used by the keyword-weighted selection strategy. Profiles are
//! evaluated in declaration order, which also breaks score ties.
//!
//! ## TOML Example
//!
//! ```toml
//! [routing]
//! fallback_tool = "text_generation"
//! search_tool = "web_search"
//!
//! [[routing.profiles]]
//! tool = "code_generation"
//! weight = 2
//! keywords = ["write code", "implement", "function"]
//!
//! [routing.reasoner]
//! enabled = true
//! model = "llama-3.1-8b-instant"
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Tool selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Generation tool chosen when no keyword matches.
    #[serde(default = "default_fallback_tool")]
    pub fallback_tool: String,

    /// Composite search tool; its output is piped into synthesis.
    #[serde(default = "default_search_tool")]
    pub search_tool: String,

    /// Tool used to synthesize an answer from search results.
    #[serde(default = "default_synthesis_tool")]
    pub synthesis_tool: String,

    /// Words signalling a need for live data (bookings, prices, news...).
    #[serde(default = "default_realtime_keywords")]
    pub realtime_keywords: Vec<String>,

    /// Per-tool keyword sets and weights.
    #[serde(default = "default_profiles")]
    pub profiles: Vec<KeywordProfile>,

    /// External reasoner settings.
    #[serde(default)]
    pub reasoner: ReasonerConfig,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            fallback_tool: default_fallback_tool(),
            search_tool: default_search_tool(),
            synthesis_tool: default_synthesis_tool(),
            realtime_keywords: default_realtime_keywords(),
            profiles: default_profiles(),
            reasoner: ReasonerConfig::default(),
        }
    }
}

/// Keyword set and priority weight owned by one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordProfile {
    /// Tool this profile scores for.
    pub tool: String,
    /// Multiplier applied to every keyword hit.
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Lower-case keywords or short phrases.
    pub keywords: Vec<String>,
}

impl KeywordProfile {
    pub fn new(tool: &str, weight: u32, keywords: &[&str]) -> Self {
        Self {
            tool: tool.to_string(),
            weight,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// External reasoner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerConfig {
    /// Whether the reasoner strategy is attempted before keyword scoring.
    #[serde(default)]
    pub enabled: bool,

    /// Model used for classification.
    #[serde(default = "default_reasoner_model")]
    pub model: String,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: default_reasoner_model(),
        }
    }
}

impl RoutingConfig {
    /// Validate tool names, weights and keywords.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("fallback_tool", &self.fallback_tool),
            ("search_tool", &self.search_tool),
            ("synthesis_tool", &self.synthesis_tool),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "routing.{field} must not be empty"
                )));
            }
        }

        let mut seen = HashSet::new();
        for (i, profile) in self.profiles.iter().enumerate() {
            if profile.tool.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "routing.profiles[{i}].tool must not be empty"
                )));
            }
            if !seen.insert(profile.tool.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "routing.profiles[{i}].tool {:?} is declared more than once",
                    profile.tool
                )));
            }
            if profile.weight == 0 {
                return Err(ConfigError::Validation(format!(
                    "routing.profiles[{i}].weight must be at least 1"
                )));
            }
            if profile.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "routing.profiles[{i}].keywords must not contain empty entries"
                )));
            }
        }

        if self.realtime_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "routing.realtime_keywords must not contain empty entries".to_string(),
            ));
        }

        if self.reasoner.enabled && self.reasoner.model.is_empty() {
            return Err(ConfigError::Validation(
                "routing.reasoner.model must be set when the reasoner is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_fallback_tool() -> String {
    "text_generation".to_string()
}

fn default_search_tool() -> String {
    "web_search".to_string()
}

fn default_synthesis_tool() -> String {
    "text_generation".to_string()
}

fn default_weight() -> u32 {
    1
}

fn default_reasoner_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_realtime_keywords() -> Vec<String> {
    [
        "book", "booking", "ticket", "flight", "train", "hotel", "reservation", "price",
        "prices", "cost", "cheapest", "deal", "news", "weather", "forecast", "latest",
        "today", "tonight", "tomorrow", "yesterday", "current", "stock", "score", "live",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_profiles() -> Vec<KeywordProfile> {
    vec![
        KeywordProfile::new(
            "code_generation",
            2,
            &[
                "write code",
                "generate code",
                "implement",
                "coding",
                "programming",
                "script",
                "function",
                "algorithm",
                "create a",
                "build a",
                "code",
            ],
        ),
        KeywordProfile::new(
            "web_search",
            2,
            &[
                "current",
                "latest",
                "today",
                "price",
                "weather",
                "news",
                "trending",
                "real-time",
                "recent",
                "happening",
                "update",
                "book",
                "flight",
                "ticket",
            ],
        ),
        KeywordProfile::new(
            "text_generation",
            1,
            &[
                "explain",
                "what is",
                "how does",
                "why",
                "difference between",
                "concept",
                "theory",
                "protocol",
                "detail",
                "describe",
                "tell me about",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_profiles_cover_builtin_tools() {
        let config = RoutingConfig::default();
        let tools: Vec<_> = config.profiles.iter().map(|p| p.tool.as_str()).collect();
        assert_eq!(tools, vec!["code_generation", "web_search", "text_generation"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_profiles_from_toml_replace_defaults() {
        let toml = r#"
            [[routing.profiles]]
            tool = "text_generation"
            weight = 3
            keywords = ["explain"]
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(
            config.routing.profiles,
            vec![KeywordProfile::new("text_generation", 3, &["explain"])]
        );
    }

    #[test]
    fn test_profile_weight_defaults_to_one() {
        let toml = r#"
            [[routing.profiles]]
            tool = "web_search"
            keywords = ["news"]
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.routing.profiles[0].weight, 1);
    }

    #[test]
    fn test_rejects_duplicate_profile() {
        let toml = r#"
            [[routing.profiles]]
            tool = "web_search"
            keywords = ["news"]

            [[routing.profiles]]
            tool = "web_search"
            keywords = ["weather"]
        "#;
        let err = AppConfig::parse(toml).unwrap_err().to_string();
        assert!(err.contains("more than once"));
    }

    #[test]
    fn test_rejects_zero_weight() {
        let toml = r#"
            [[routing.profiles]]
            tool = "web_search"
            weight = 0
            keywords = ["news"]
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_rejects_blank_keyword() {
        let toml = r#"
            [[routing.profiles]]
            tool = "web_search"
            keywords = ["news", "  "]
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_rejects_empty_fallback() {
        let toml = r#"
            [routing]
            fallback_tool = ""
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_reasoner_section() {
        let toml = r#"
            [routing.reasoner]
            enabled = true
            model = "small-router"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert!(config.routing.reasoner.enabled);
        assert_eq!(config.routing.reasoner.model, "small-router");
    }
}
