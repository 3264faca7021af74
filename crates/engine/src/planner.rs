//! Query planning
//!
//! Asks the language model for a directed, dependency-annotated list of
//! execution steps. The model's raw text is parsed strictly as JSON;
//! parse failure is fatal for the planning attempt and the caller
//! decides whether to reject the complex path. Declared step order is
//! execution order; dependencies are never used to resort.

use crate::prompts;
use crate::types::{ComplexityAnalysis, ExecutionPlan};
use graphrag_common::errors::{AppError, Result};
use graphrag_common::llm::{split_thinking, LanguageModel};
use std::sync::Arc;

/// Plans multi-step execution for complex queries
pub struct QueryPlanner {
    llm: Arc<dyn LanguageModel>,
}

impl QueryPlanner {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Create a step-by-step execution plan
    pub async fn plan(&self, query: &str, complexity: &ComplexityAnalysis) -> Result<ExecutionPlan> {
        let prompt = prompts::planning_prompt(query, complexity);

        // Run the call on its own task so a slow plan never holds up
        // other queries sharing this executor
        let llm = self.llm.clone();
        let response = tokio::spawn(async move { llm.invoke(&prompt).await })
            .await
            .map_err(|e| AppError::Internal {
                message: format!("planning task failed: {}", e),
            })??;

        let plan = parse_plan(&response)?;

        tracing::info!(
            steps = plan.steps.len(),
            confidence = plan.confidence_estimate,
            "execution plan created"
        );

        Ok(plan)
    }
}

/// Parse the model output strictly as a JSON execution plan
fn parse_plan(response: &str) -> Result<ExecutionPlan> {
    let (_, answer) = split_thinking(response);

    // Models often wrap the object in prose or code fences; locate the
    // outermost braces, then parse strictly
    let start = answer.find('{');
    let end = answer.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if s < e => &answer[s..=e],
        _ => {
            return Err(AppError::PlanningFailed {
                message: "planner output contains no JSON object".to_string(),
            })
        }
    };

    serde_json::from_str(body).map_err(|e| AppError::PlanningFailed {
        message: format!("planner output is not a valid plan: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryType;
    use async_trait::async_trait;
    use graphrag_common::llm::ModelResponse;

    struct CannedModel {
        reply: String,
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn invoke(&self, _prompt: &str) -> Result<String> {
            Ok(self.reply.clone())
        }

        async fn invoke_structured(&self, _system: &str, _input: &str) -> Result<ModelResponse> {
            Ok(ModelResponse::Text(self.reply.clone()))
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    const PLAN_JSON: &str = r#"{
        "steps": [
            {
                "step_id": "find_characters",
                "description": "Locate the main characters",
                "query_type": "entity_search",
                "parameters": {},
                "dependencies": [],
                "expected_confidence": 90
            },
            {
                "step_id": "combine",
                "description": "Synthesize",
                "query_type": "synthesis",
                "parameters": {},
                "dependencies": ["find_characters"],
                "expected_confidence": 75
            }
        ],
        "confidence_estimate": 80,
        "estimated_time": 12.0
    }"#;

    async fn plan_with(reply: &str) -> Result<ExecutionPlan> {
        let planner = QueryPlanner::new(Arc::new(CannedModel {
            reply: reply.to_string(),
        }));
        planner
            .plan("Trace the story", &ComplexityAnalysis::default())
            .await
    }

    #[tokio::test]
    async fn test_plan_parses_and_keeps_array_order() {
        let plan = plan_with(PLAN_JSON).await.unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].step_id, "find_characters");
        assert_eq!(plan.steps[0].query_type, QueryType::EntitySearch);
        assert_eq!(plan.steps[1].query_type, QueryType::Synthesis);
        assert_eq!(plan.confidence_estimate, 80.0);
    }

    #[tokio::test]
    async fn test_plan_inside_prose_and_thinking() {
        let wrapped = format!("<think>let me plan</think>Here is the plan:\n{}", PLAN_JSON);
        let plan = plan_with(&wrapped).await.unwrap();
        assert_eq!(plan.steps.len(), 2);
    }

    #[tokio::test]
    async fn test_non_json_output_is_planning_failure() {
        let err = plan_with("I cannot plan this, sorry.").await.unwrap_err();
        assert!(matches!(err, AppError::PlanningFailed { .. }));
    }

    #[tokio::test]
    async fn test_malformed_plan_is_planning_failure() {
        let err = plan_with(r#"{"steps": "not an array"}"#).await.unwrap_err();
        assert!(matches!(err, AppError::PlanningFailed { .. }));
    }
}
