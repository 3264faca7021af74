//! Complexity classification
//!
//! Decides whether a query needs single-shot retrieval or multi-step
//! planning. Pure function of the query text and whether the
//! conversation has prior turns; identical inputs always produce
//! identical flags.

use crate::types::ComplexityAnalysis;
use graphrag_common::ConversationState;

/// Keywords that mark a query as complex
const COMPLEXITY_KEYWORDS: &[&str] = &[
    "trace",
    "compare",
    "analyze",
    "evolution",
    "cascading",
    "influence",
    "throughout",
    "across",
    "connect",
    "relationship",
    "effects",
    "impact",
    "how does",
    "what happens when",
    "contrast",
    "similarities",
    "differences",
    "patterns",
    "trends",
    "correlations",
];

/// Advisory sub-flag lexicons; disjoint subsets of the main lexicon
const MULTI_STEP_KEYWORDS: &[&str] =
    &["trace", "evolution", "throughout", "cascading", "what happens when"];
const COMPARISON_KEYWORDS: &[&str] = &["compare", "contrast", "similarities", "differences"];
const RELATIONSHIP_KEYWORDS: &[&str] =
    &["relationship", "influence", "connect", "effects", "impact"];

/// Classifies query complexity from text alone
#[derive(Debug, Clone)]
pub struct ComplexityClassifier {
    /// Word count above which a query is no longer simple
    word_limit: usize,
}

impl Default for ComplexityClassifier {
    fn default() -> Self {
        Self { word_limit: 10 }
    }
}

impl ComplexityClassifier {
    pub fn new(word_limit: usize) -> Self {
        Self { word_limit }
    }

    /// Classify a query against the conversation state
    pub fn classify(&self, query: &str, state: &ConversationState) -> ComplexityAnalysis {
        let query = query.trim();
        if query.is_empty() {
            // Empty queries are simple by definition
            return ComplexityAnalysis {
                is_simple: true,
                context_dependent: !state.is_empty(),
                ..Default::default()
            };
        }

        let lowered = query.to_lowercase();
        let word_count = query.split_whitespace().count();

        let has_complexity_keyword = COMPLEXITY_KEYWORDS
            .iter()
            .any(|kw| lowered.contains(kw));

        let is_simple = !(has_complexity_keyword || word_count > self.word_limit);

        ComplexityAnalysis {
            is_simple,
            needs_planning: !is_simple,
            needs_multi_step: MULTI_STEP_KEYWORDS.iter().any(|kw| lowered.contains(kw)),
            needs_comparison: COMPARISON_KEYWORDS.iter().any(|kw| lowered.contains(kw)),
            needs_relationship_analysis: RELATIONSHIP_KEYWORDS
                .iter()
                .any(|kw| lowered.contains(kw)),
            context_dependent: !state.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(query: &str) -> ComplexityAnalysis {
        ComplexityClassifier::default().classify(query, &ConversationState::new())
    }

    #[test]
    fn test_short_factual_query_is_simple() {
        // 3 words, no complexity keyword
        let analysis = classify("Who is Dracula?");
        assert!(analysis.is_simple);
        assert!(!analysis.needs_planning);
        assert!(!analysis.context_dependent);
    }

    #[test]
    fn test_trace_query_needs_planning() {
        let analysis =
            classify("Trace Jonathan Harker's psychological evolution throughout the novel");
        assert!(!analysis.is_simple);
        assert!(analysis.needs_planning);
        assert!(analysis.needs_multi_step);
    }

    #[test]
    fn test_long_query_is_complex_without_keywords() {
        let analysis = classify(
            "Tell me everything you know about the castle where the story begins please",
        );
        assert!(!analysis.is_simple);
    }

    #[test]
    fn test_sub_flags_can_fire_on_simple_query() {
        // "impact" triggers the relationship flag but the query stays
        // short; flags are advisory, not gating
        let analysis = classify("What impact?");
        assert!(analysis.is_simple);
        assert!(analysis.needs_relationship_analysis);
    }

    #[test]
    fn test_comparison_flag() {
        let analysis = classify("Compare Mina and Lucy");
        assert!(!analysis.is_simple);
        assert!(analysis.needs_comparison);
        assert!(!analysis.needs_multi_step);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let analysis = classify("COMPARE the two men");
        assert!(!analysis.is_simple);
    }

    #[test]
    fn test_empty_query_is_simple() {
        let analysis = classify("   ");
        assert!(analysis.is_simple);
        assert!(!analysis.needs_planning);
    }

    #[test]
    fn test_context_dependent_tracks_state() {
        let mut state = ConversationState::new();
        state.append("hello", "hi");
        let analysis = ComplexityClassifier::default().classify("Who is Dracula?", &state);
        assert!(analysis.context_dependent);
        assert!(analysis.is_simple);
    }

    #[test]
    fn test_determinism() {
        let state = ConversationState::new();
        let classifier = ComplexityClassifier::default();
        let a = classifier.classify("How does the count influence Renfield?", &state);
        let b = classifier.classify("How does the count influence Renfield?", &state);
        assert_eq!(a, b);
        assert!(!a.is_simple);
        assert!(a.needs_relationship_analysis);
    }
}
