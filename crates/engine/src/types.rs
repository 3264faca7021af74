//! Plan and result types for the agentic query path
//!
//! These are the shapes exchanged between the planner, the step
//! executor and the synthesizer. Steps are created by the planner and
//! read-only afterward; results are appended to an execution history
//! that is never rewritten.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Complexity flags derived from the query text and conversation state
///
/// Sub-flags are advisory hints for the planner prompt; they do not
/// gate the simple/complex routing decision.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplexityAnalysis {
    pub is_simple: bool,
    pub needs_planning: bool,
    pub needs_multi_step: bool,
    pub needs_comparison: bool,
    pub needs_relationship_analysis: bool,
    pub context_dependent: bool,
}

/// Kind of work a single plan step performs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    EntitySearch,
    RelationshipTraverse,
    Synthesis,
    Validation,
    /// Anything else the planner emitted; fails at dispatch, not parse
    #[serde(untagged)]
    Other(String),
}

impl QueryType {
    pub fn as_str(&self) -> &str {
        match self {
            QueryType::EntitySearch => "entity_search",
            QueryType::RelationshipTraverse => "relationship_traverse",
            QueryType::Synthesis => "synthesis",
            QueryType::Validation => "validation",
            QueryType::Other(s) => s,
        }
    }
}

/// Single step in a query execution plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Unique identifier within the plan
    pub step_id: String,

    /// What this step does
    pub description: String,

    /// Dispatch type
    pub query_type: QueryType,

    /// Step-specific parameters
    #[serde(default)]
    pub parameters: HashMap<String, Value>,

    /// Ids of steps this one depends on; declared order is execution
    /// order, dependencies are not used to resort
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Planner's confidence estimate, 0-100
    #[serde(default)]
    pub expected_confidence: f32,
}

/// Complete execution plan for a complex query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<ExecutionStep>,

    /// Overall plan confidence, 0-100
    pub confidence_estimate: f32,

    /// Planner's wall-clock estimate in seconds
    pub estimated_time: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_strategy: Option<String>,
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,

    pub success: bool,

    /// Opaque payload; structure depends on the step type
    pub data: Value,

    /// Confidence 0-100; forced to 0 on failure
    pub confidence: f32,

    /// One-line account of what happened
    pub summary: String,

    pub sources: Vec<String>,

    /// Wall-clock time around the dispatch call
    pub execution_time: Duration,
}

impl StepResult {
    /// Build a failed result carrying the error message
    pub fn failure(step_id: &str, message: String, execution_time: Duration) -> Self {
        Self {
            step_id: step_id.to_string(),
            success: false,
            data: serde_json::json!({"error": message}),
            confidence: 0.0,
            summary: message,
            sources: Vec::new(),
            execution_time,
        }
    }
}

/// Final synthesized result for one complex query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResult {
    pub answer: String,

    /// Arithmetic mean of successful step confidences, 0-100
    pub confidence: f32,

    /// Deduplicated union of step sources
    pub sources: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitations: Option<String>,

    /// Ordered summaries of successful steps
    pub reasoning_chain: Vec<String>,
}

/// Output contract of the entity extractor
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entities {
    /// Free-form surface names, deduplicated case-insensitively
    pub names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_serde_names() {
        let t: QueryType = serde_json::from_str("\"entity_search\"").unwrap();
        assert_eq!(t, QueryType::EntitySearch);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"entity_search\"");
    }

    #[test]
    fn test_unknown_query_type_parses() {
        let t: QueryType = serde_json::from_str("\"graph_update\"").unwrap();
        assert_eq!(t, QueryType::Other("graph_update".to_string()));
        assert_eq!(t.as_str(), "graph_update");
    }

    #[test]
    fn test_plan_deserialization() {
        let raw = r#"{
            "steps": [
                {
                    "step_id": "extract_entities",
                    "description": "Extract key entities from the query",
                    "query_type": "entity_search",
                    "parameters": {"entities": ["Dracula"]},
                    "dependencies": [],
                    "expected_confidence": 90
                },
                {
                    "step_id": "combine",
                    "description": "Synthesize findings",
                    "query_type": "synthesis",
                    "parameters": {},
                    "dependencies": ["extract_entities"],
                    "expected_confidence": 80
                }
            ],
            "confidence_estimate": 85,
            "estimated_time": 10.5
        }"#;
        let plan: ExecutionPlan = serde_json::from_str(raw).unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[1].dependencies, vec!["extract_entities"]);
        assert_eq!(plan.confidence_estimate, 85.0);
        assert!(plan.fallback_strategy.is_none());
    }

    #[test]
    fn test_failure_result_shape() {
        let result = StepResult::failure("s1", "boom".to_string(), Duration::from_millis(5));
        assert!(!result.success);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.data["error"], "boom");
        assert!(result.sources.is_empty());
    }
}
