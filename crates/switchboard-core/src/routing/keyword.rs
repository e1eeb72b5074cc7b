//! Deterministic keyword-weighted tool selection.
//!
//! Each keyword contributes once, at its best match tier:
//!
//! | tier       | condition                          | points      |
//! |------------|------------------------------------|-------------|
//! | standalone | word boundary on both sides        | 10 × weight |
//! | affix      | word boundary on exactly one side  | 8 × weight  |
//! | substring  | embedded with no boundary          | 5 × weight  |
//!
//! Confidence is 25 per matched keyword, capped at 100.

use switchboard_config::KeywordProfile;

use super::{FALLBACK_CONFIDENCE, RoutingDecision, Strategy};

/// Confidence contributed by each matched keyword.
pub const CONFIDENCE_PER_KEYWORD: u32 = 25;

/// How a keyword occurred in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Substring,
    Affix,
    Standalone,
}

impl MatchTier {
    pub fn points(self) -> u32 {
        match self {
            MatchTier::Standalone => 10,
            MatchTier::Affix => 8,
            MatchTier::Substring => 5,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Best tier at which `keyword` occurs in `haystack`, if at all.
///
/// Both arguments are expected to be lower-case.
pub fn match_tier(haystack: &str, keyword: &str) -> Option<MatchTier> {
    if keyword.is_empty() {
        return None;
    }
    let mut best: Option<MatchTier> = None;
    for (start, matched) in haystack.match_indices(keyword) {
        let end = start + matched.len();
        let left = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !is_word_char(c));
        let right = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !is_word_char(c));
        let tier = match (left, right) {
            (true, true) => return Some(MatchTier::Standalone),
            (true, false) | (false, true) => MatchTier::Affix,
            (false, false) => MatchTier::Substring,
        };
        best = best.max(Some(tier));
    }
    best
}

/// Score of one tool for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolScore {
    pub tool: String,
    pub score: u32,
    /// Keywords that matched at any tier.
    pub matched: Vec<String>,
}

/// Scores messages against per-tool keyword profiles.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    profiles: Vec<KeywordProfile>,
    fallback_tool: String,
}

impl KeywordScorer {
    pub fn new(profiles: &[KeywordProfile], fallback_tool: impl Into<String>) -> Self {
        let profiles = profiles
            .iter()
            .map(|p| KeywordProfile {
                tool: p.tool.clone(),
                weight: p.weight,
                keywords: p.keywords.iter().map(|k| k.trim().to_lowercase()).collect(),
            })
            .collect();
        Self {
            profiles,
            fallback_tool: fallback_tool.into(),
        }
    }

    /// Scores for every profiled tool in `available`, in profile order.
    pub fn scores(&self, message: &str, available: &[String]) -> Vec<ToolScore> {
        let text = message.to_lowercase();
        self.profiles
            .iter()
            .filter(|p| available.iter().any(|a| a == &p.tool))
            .map(|profile| {
                let mut score: u32 = 0;
                let mut matched = Vec::new();
                for keyword in &profile.keywords {
                    if let Some(tier) = match_tier(&text, keyword) {
                        score = tier
                            .points()
                            .saturating_mul(profile.weight)
                            .saturating_add(score);
                        matched.push(keyword.clone());
                    }
                }
                ToolScore {
                    tool: profile.tool.clone(),
                    score,
                    matched,
                }
            })
            .collect()
    }

    /// Pick the highest-scoring tool. Ties go to the earlier profile.
    pub fn decide(&self, message: &str, available: &[String]) -> RoutingDecision {
        let mut best: Option<ToolScore> = None;
        for candidate in self.scores(message, available) {
            if candidate.score > best.as_ref().map_or(0, |b| b.score) {
                best = Some(candidate);
            }
        }

        match best {
            Some(winner) => {
                let count = winner.matched.len() as u32;
                RoutingDecision {
                    confidence: count.saturating_mul(CONFIDENCE_PER_KEYWORD).min(100) as u8,
                    reasoning: format!(
                        "matched {count} keyword(s) [{}], score {}",
                        winner.matched.join(", "),
                        winner.score
                    ),
                    tool: winner.tool,
                    strategy: Strategy::Keyword,
                }
            }
            None => RoutingDecision {
                tool: self.fallback_tool.clone(),
                confidence: FALLBACK_CONFIDENCE,
                strategy: Strategy::Fallback,
                reasoning: "no keywords matched; using fallback tool".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use switchboard_config::RoutingConfig;

    fn tools(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn default_scorer() -> KeywordScorer {
        let config = RoutingConfig::default();
        KeywordScorer::new(&config.profiles, config.fallback_tool)
    }

    const ALL: &[&str] = &["text_generation", "code_generation", "web_search"];

    #[test]
    fn test_match_tiers() {
        assert_eq!(match_tier("write code now", "code"), Some(MatchTier::Standalone));
        assert_eq!(match_tier("unicode", "code"), Some(MatchTier::Affix));
        assert_eq!(match_tier("codec", "code"), Some(MatchTier::Affix));
        assert_eq!(match_tier("barcodes", "code"), Some(MatchTier::Substring));
        assert_eq!(match_tier("nothing here", "code"), None);
    }

    #[test]
    fn test_best_occurrence_wins() {
        // First occurrence is embedded, second is standalone.
        assert_eq!(match_tier("barcodes and code", "code"), Some(MatchTier::Standalone));
    }

    #[test]
    fn test_punctuation_is_a_boundary() {
        assert_eq!(match_tier("news?", "news"), Some(MatchTier::Standalone));
        assert_eq!(match_tier("(weather)", "weather"), Some(MatchTier::Standalone));
    }

    #[test]
    fn test_phrase_keyword() {
        assert_eq!(match_tier("please write code for me", "write code"), Some(MatchTier::Standalone));
    }

    #[test]
    fn test_code_request() {
        let decision = default_scorer().decide("Write code to reverse a string", &tools(ALL));
        assert_eq!(decision.tool, "code_generation");
        assert_eq!(decision.strategy, Strategy::Keyword);
        // "write code" and "code"
        assert_eq!(decision.confidence, 50);
    }

    #[test]
    fn test_news_request() {
        let decision = default_scorer().decide("latest news today", &tools(ALL));
        assert_eq!(decision.tool, "web_search");
        assert_eq!(decision.confidence, 75);
    }

    #[test]
    fn test_explanation_request() {
        let decision = default_scorer().decide("Explain the difference between TCP and UDP", &tools(ALL));
        assert_eq!(decision.tool, "text_generation");
    }

    #[test]
    fn test_confidence_caps_at_100() {
        let decision = default_scorer().decide(
            "current latest today price weather news trending",
            &tools(ALL),
        );
        assert_eq!(decision.confidence, 100);
    }

    #[test]
    fn test_no_match_uses_fallback() {
        let decision = default_scorer().decide("zebra giraffe", &tools(ALL));
        assert_eq!(decision.tool, "text_generation");
        assert_eq!(decision.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(decision.strategy, Strategy::Fallback);
    }

    #[test]
    fn test_unregistered_tools_not_scored() {
        let decision = default_scorer().decide("write code", &tools(&["text_generation"]));
        assert_eq!(decision.tool, "text_generation");
        assert_eq!(decision.strategy, Strategy::Fallback);
    }

    #[test]
    fn test_tie_goes_to_earlier_profile() {
        let profiles = vec![
            KeywordProfile::new("first", 1, &["alpha"]),
            KeywordProfile::new("second", 1, &["beta"]),
        ];
        let scorer = KeywordScorer::new(&profiles, "first");
        let decision = scorer.decide("alpha beta", &tools(&["second", "first"]));
        assert_eq!(decision.tool, "first");
    }

    #[test]
    fn test_weight_multiplies_points() {
        let profiles = vec![
            KeywordProfile::new("light", 1, &["thing"]),
            KeywordProfile::new("heavy", 3, &["thing"]),
        ];
        let scorer = KeywordScorer::new(&profiles, "light");
        let scores = scorer.scores("a thing", &tools(&["light", "heavy"]));
        assert_eq!(scores[0].score, 10);
        assert_eq!(scores[1].score, 30);
    }

    #[test]
    fn test_huge_weight_saturates() {
        let config = switchboard_config::AppConfig::parse(
            "[[routing.profiles]]\ntool = \"text_generation\"\nweight = 4000000000\nkeywords = [\"thing\", \"stuff\"]\n\n[[routing.profiles]]\ntool = \"code_generation\"\nweight = 1\nkeywords = [\"thing\"]\n",
        )
        .unwrap();
        let scorer = KeywordScorer::new(&config.routing.profiles, "code_generation");

        let available = tools(&["text_generation", "code_generation"]);
        let scores = scorer.scores("a thing and stuff", &available);
        assert_eq!(scores[0].score, u32::MAX);
        assert_eq!(scores[1].score, 10);

        let decision = scorer.decide("a thing and stuff", &available);
        assert_eq!(decision.tool, "text_generation");
        assert_eq!(decision.confidence, 50);
    }

    #[test]
    fn test_deterministic() {
        let scorer = default_scorer();
        let first = scorer.decide("build a weather script", &tools(ALL));
        for _ in 0..10 {
            assert_eq!(scorer.decide("build a weather script", &tools(ALL)), first);
        }
    }
}
