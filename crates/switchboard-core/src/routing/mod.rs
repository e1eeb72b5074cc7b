//! Tool selection.
//!
//! A message passes through three stages:
//!
//! 1. **Conversational check**: small talk gets a canned reply, no tool.
//! 2. **Selection**: the external reasoner when configured and any tool is
//!    available, else (or on any reasoner failure) keyword scoring.
//! 3. **Governance**: unavailable picks are substituted, and low-confidence
//!    picks are redirected to live search on realtime intent or floored.

pub mod conversational;
pub mod keyword;
pub mod reasoner;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchboard_config::RoutingConfig;
use tracing::{debug, warn};

use crate::COLLABORATOR_TIMEOUT;
use crate::status::StatusLog;

pub use conversational::SmallTalk;
pub use keyword::{KeywordScorer, MatchTier};
pub use reasoner::{LlmReasoner, Reasoner, ReasonerError, ReasonerVerdict};

/// Below this, governance applies realtime redirection or the floor.
pub const CONFIDENCE_THRESHOLD: u8 = 70;
/// Minimum confidence after governance when no redirect happens.
pub const CONFIDENCE_FLOOR: u8 = 60;
/// Confidence for fallback and substituted selections.
pub const FALLBACK_CONFIDENCE: u8 = 50;
/// Confidence reported for small-talk replies.
pub const CONVERSATIONAL_CONFIDENCE: u8 = 100;
/// Pseudo-tool name reported for small-talk replies.
pub const CONVERSATIONAL_TOOL: &str = "conversational";

/// Which strategy produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Conversational,
    Reasoner,
    Keyword,
    Fallback,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Strategy::Conversational => "conversational",
            Strategy::Reasoner => "reasoner",
            Strategy::Keyword => "keyword",
            Strategy::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// A selected tool with confidence in 0..=100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub tool: String,
    pub confidence: u8,
    pub strategy: Strategy,
    pub reasoning: String,
}

/// Outcome of selection: a decision, or the reason the reasoner was
/// unusable and keyword scoring must be used.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Decided(RoutingDecision),
    Fallback(ReasonerError),
}

/// Result of routing one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Small talk: reply directly.
    Conversational {
        kind: SmallTalk,
        decision: RoutingDecision,
    },
    /// Invoke a tool.
    Tool(RoutingDecision),
}

/// Chooses a tool for each message.
pub struct Router {
    config: RoutingConfig,
    scorer: KeywordScorer,
    reasoner: Option<Arc<dyn Reasoner>>,
    reasoner_timeout: Duration,
}

impl Router {
    pub fn new(config: RoutingConfig) -> Self {
        let scorer = KeywordScorer::new(&config.profiles, config.fallback_tool.clone());
        Self {
            config,
            scorer,
            reasoner: None,
            reasoner_timeout: COLLABORATOR_TIMEOUT,
        }
    }

    pub fn with_reasoner(mut self, reasoner: Arc<dyn Reasoner>) -> Self {
        self.reasoner = Some(reasoner);
        self
    }

    pub fn with_reasoner_timeout(mut self, timeout: Duration) -> Self {
        self.reasoner_timeout = timeout;
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Route a message against the currently available tool names.
    pub async fn route(&self, message: &str, available: &[String], status: &mut StatusLog) -> Route {
        match self.converse(message, status) {
            Some((kind, decision)) => Route::Conversational { kind, decision },
            None => Route::Tool(self.select(message, available, status).await),
        }
    }

    /// The conversational check on its own. Needs no tool list.
    pub fn converse(&self, message: &str, status: &mut StatusLog) -> Option<(SmallTalk, RoutingDecision)> {
        let kind = conversational::classify(message)?;
        status.emit(format!("Conversational message ({})", kind.label()));
        let decision = RoutingDecision {
            tool: CONVERSATIONAL_TOOL.to_string(),
            confidence: CONVERSATIONAL_CONFIDENCE,
            strategy: Strategy::Conversational,
            reasoning: format!("{} message", kind.label()),
        };
        Some((kind, decision))
    }

    /// Tool selection for a message already known not to be small talk.
    pub async fn select(
        &self,
        message: &str,
        available: &[String],
        status: &mut StatusLog,
    ) -> RoutingDecision {
        let decision = match self.consult_reasoner(message, available).await {
            Some(Selection::Decided(decision)) => {
                status.emit(format!("Reasoner selected {}", decision.tool));
                decision
            }
            Some(Selection::Fallback(reason)) => {
                warn!(error = %reason, "reasoner unusable, falling back to keyword scoring");
                status.emit("Reasoner unavailable, using keyword scoring");
                self.scorer.decide(message, available)
            }
            None => self.scorer.decide(message, available),
        };
        status.emit(format!(
            "Selected {} via {} ({}% confidence)",
            decision.tool, decision.strategy, decision.confidence
        ));

        let governed = self.govern(decision.clone(), message, available);
        if governed != decision {
            status.emit(format!(
                "Adjusted selection to {} ({}% confidence)",
                governed.tool, governed.confidence
            ));
        }
        governed
    }

    /// Ask the reasoner, if one is configured and there is anything to choose from.
    pub async fn consult_reasoner(&self, message: &str, available: &[String]) -> Option<Selection> {
        let reasoner = self.reasoner.as_ref()?;
        if available.is_empty() {
            return None;
        }

        let outcome = match tokio::time::timeout(
            self.reasoner_timeout,
            reasoner.classify(message, available),
        )
        .await
        {
            Ok(Ok(raw)) => ReasonerVerdict::from_value(&raw, available),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ReasonerError::Timeout(self.reasoner_timeout.as_secs())),
        };

        Some(match outcome {
            Ok(verdict) => {
                debug!(tool = %verdict.tool, confidence = verdict.confidence, "reasoner verdict");
                Selection::Decided(RoutingDecision {
                    tool: verdict.tool,
                    confidence: verdict.confidence.min(100),
                    strategy: Strategy::Reasoner,
                    reasoning: verdict.reasoning,
                })
            }
            Err(reason) => Selection::Fallback(reason),
        })
    }

    /// Apply substitution, realtime redirection and the confidence floor.
    pub fn govern(&self, mut decision: RoutingDecision, message: &str, available: &[String]) -> RoutingDecision {
        if !available.contains(&decision.tool) {
            let substitute = available
                .first()
                .cloned()
                .unwrap_or_else(|| self.config.fallback_tool.clone());
            decision.reasoning = format!(
                "{}; '{}' is not registered, substituted '{}'",
                decision.reasoning, decision.tool, substitute
            );
            decision.tool = substitute;
            decision.confidence = FALLBACK_CONFIDENCE;
        }

        if decision.confidence < CONFIDENCE_THRESHOLD {
            let search = &self.config.search_tool;
            if self.has_realtime_intent(message) && available.contains(search) {
                if decision.tool != *search {
                    decision.reasoning =
                        format!("{}; realtime intent, redirected to '{search}'", decision.reasoning);
                    decision.tool = search.clone();
                }
            } else {
                decision.confidence = decision.confidence.max(CONFIDENCE_FLOOR);
            }
        }

        decision.confidence = decision.confidence.min(100);
        decision
    }

    /// Whether the message mentions any realtime-intent keyword.
    pub fn has_realtime_intent(&self, message: &str) -> bool {
        let text = message.to_lowercase();
        self.config
            .realtime_keywords
            .iter()
            .any(|k| keyword::match_tier(&text, &k.to_lowercase()).is_some())
    }
}
