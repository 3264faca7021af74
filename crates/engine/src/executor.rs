//! Step execution
//!
//! Dispatches a single plan step, times it, and records the outcome.
//! `execute` always returns a StepResult; internal errors become a
//! failed result carrying the error message, never a propagated error.
//! The execution history is passed in explicitly so the ordering
//! contract between earlier steps and synthesis is visible at the call
//! site.

use crate::extractor::EntityExtractor;
use crate::prompts;
use crate::retrieval::{fulltext_query, HybridRetriever};
use crate::types::{ExecutionStep, QueryType, StepResult};
use graphrag_common::errors::{AppError, Result};
use graphrag_common::graph::GraphStore;
use graphrag_common::llm::{split_thinking, LanguageModel};
use graphrag_common::ENTITY_INDEX;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Soft-success confidence for traversals with too few entities
const EMPTY_PATH_CONFIDENCE: f32 = 30.0;

/// Outcome of a successful dispatch before wrapping into a StepResult
struct StepPayload {
    data: Value,
    confidence: f32,
    summary: String,
    sources: Vec<String>,
}

/// Executes individual plan steps
pub struct StepExecutor {
    retriever: Arc<HybridRetriever>,
    extractor: Arc<EntityExtractor>,
    store: Arc<dyn GraphStore>,
    llm: Arc<dyn LanguageModel>,
    max_path_hops: usize,
}

impl StepExecutor {
    pub fn new(
        retriever: Arc<HybridRetriever>,
        extractor: Arc<EntityExtractor>,
        store: Arc<dyn GraphStore>,
        llm: Arc<dyn LanguageModel>,
        max_path_hops: usize,
    ) -> Self {
        Self {
            retriever,
            extractor,
            store,
            llm,
            max_path_hops,
        }
    }

    /// Execute one step against the history recorded so far
    pub async fn execute(
        &self,
        step: &ExecutionStep,
        original_query: &str,
        history: &[StepResult],
    ) -> StepResult {
        let start = Instant::now();

        let outcome = self.dispatch(step, original_query, history).await;
        let execution_time = start.elapsed();

        metrics::counter!("graphrag_plan_steps_total").increment(1);
        metrics::histogram!("graphrag_step_duration_seconds")
            .record(execution_time.as_secs_f64());

        match outcome {
            Ok(payload) => StepResult {
                step_id: step.step_id.clone(),
                success: true,
                data: payload.data,
                confidence: payload.confidence,
                summary: payload.summary,
                sources: payload.sources,
                execution_time,
            },
            Err(e) => {
                tracing::warn!(
                    step_id = %step.step_id,
                    query_type = step.query_type.as_str(),
                    error = %e,
                    "step failed"
                );
                metrics::counter!("graphrag_plan_step_failures_total").increment(1);
                StepResult::failure(&step.step_id, e.to_string(), execution_time)
            }
        }
    }

    async fn dispatch(
        &self,
        step: &ExecutionStep,
        original_query: &str,
        history: &[StepResult],
    ) -> Result<StepPayload> {
        match &step.query_type {
            QueryType::EntitySearch => self.entity_search(step, original_query).await,
            QueryType::RelationshipTraverse => self.relationship_traverse(original_query).await,
            QueryType::Synthesis => self.synthesis(original_query, history).await,
            other => Err(AppError::UnsupportedStepType {
                query_type: other.as_str().to_string(),
            }),
        }
    }

    /// Structured neighborhood lookup, preferring the planner's declared
    /// entities over re-extraction
    async fn entity_search(
        &self,
        step: &ExecutionStep,
        original_query: &str,
    ) -> Result<StepPayload> {
        let declared: Vec<String> = step
            .parameters
            .get("entities")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let result = if declared.is_empty() {
            self.retriever.structured().retrieve(original_query).await
        } else {
            self.retriever
                .structured()
                .retrieve_for_entities(&declared)
                .await
        };

        let rows = result.lines().filter(|l| !l.trim().is_empty()).count();

        Ok(StepPayload {
            data: json!({"result": result}),
            confidence: step.expected_confidence,
            summary: format!("entity search found {} neighborhood facts", rows),
            sources: vec!["knowledge graph".to_string()],
        })
    }

    /// Bounded all-shortest-paths traversal between the first two
    /// entities extracted from the original query
    async fn relationship_traverse(&self, original_query: &str) -> Result<StepPayload> {
        let entities = self.extractor.extract(original_query).await;

        if entities.names.len() < 2 {
            // Soft success: the synthesizer discounts this step rather
            // than treating it as an execution fault
            return Ok(StepPayload {
                data: json!({"paths": []}),
                confidence: EMPTY_PATH_CONFIDENCE,
                summary: "not enough entities to find a path".to_string(),
                sources: Vec::new(),
            });
        }

        let first = &entities.names[0];
        let second = &entities.names[1];

        let statement = format!(
            "CALL db.index.fulltext.queryNodes('{index}', $first, {{limit:1}}) YIELD node AS a \
             CALL db.index.fulltext.queryNodes('{index}', $second, {{limit:1}}) YIELD node AS b \
             MATCH p = allShortestPaths((a)-[*..{hops}]-(b)) \
             RETURN [n IN nodes(p) | n.id] AS nodes, \
                    [r IN relationships(p) | type(r)] AS relationships",
            index = ENTITY_INDEX,
            hops = self.max_path_hops,
        );

        let rows = self
            .store
            .query(
                &statement,
                json!({
                    "first": fulltext_query(first),
                    "second": fulltext_query(second),
                }),
            )
            .await?;

        let paths: Vec<Value> = rows.into_iter().map(Value::Object).collect();
        let count = paths.len();

        Ok(StepPayload {
            data: json!({"paths": paths}),
            confidence: if count > 0 { 85.0 } else { EMPTY_PATH_CONFIDENCE },
            summary: format!("found {} paths between {} and {}", count, first, second),
            sources: vec!["knowledge graph".to_string()],
        })
    }

    /// Merge the data of all prior successful steps through the model
    async fn synthesis(
        &self,
        original_query: &str,
        history: &[StepResult],
    ) -> Result<StepPayload> {
        let successful: Vec<&StepResult> = history.iter().filter(|r| r.success).collect();

        let findings = successful
            .iter()
            .map(|r| format!("[{}] {}", r.step_id, r.data))
            .collect::<Vec<_>>()
            .join("\n");

        let response = self
            .llm
            .invoke(&prompts::synthesis_prompt(original_query, &findings))
            .await?;
        let (_, answer) = split_thinking(&response);

        let sources: Vec<String> = {
            let mut seen = std::collections::HashSet::new();
            successful
                .iter()
                .flat_map(|r| r.sources.iter())
                .filter(|s| seen.insert(s.as_str()))
                .cloned()
                .collect()
        };

        Ok(StepPayload {
            data: json!({"synthesis": answer}),
            confidence: if successful.is_empty() { EMPTY_PATH_CONFIDENCE } else { 80.0 },
            summary: format!("synthesized findings from {} prior steps", successful.len()),
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use graphrag_common::llm::ModelResponse;
    use graphrag_common::vector::{Passage, VectorIndex};
    use serde_json::Map;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FakeModel {
        names: Vec<&'static str>,
        reply: &'static str,
    }

    #[async_trait]
    impl LanguageModel for FakeModel {
        async fn invoke(&self, _prompt: &str) -> Result<String> {
            Ok(self.reply.to_string())
        }

        async fn invoke_structured(&self, _system: &str, _input: &str) -> Result<ModelResponse> {
            Ok(ModelResponse::Structured(json!({"names": self.names})))
        }

        fn model_name(&self) -> &str {
            "fake"
        }
    }

    struct FakeStore {
        rows: Vec<Map<String, Value>>,
    }

    #[async_trait]
    impl GraphStore for FakeStore {
        async fn query(&self, _statement: &str, _parameters: Value) -> Result<Vec<Map<String, Value>>> {
            Ok(self.rows.clone())
        }
    }

    struct EmptyVector;

    #[async_trait]
    impl VectorIndex for EmptyVector {
        async fn similarity_search(&self, _text: &str, _k: usize) -> Result<Vec<Passage>> {
            Ok(Vec::new())
        }
    }

    fn executor(names: Vec<&'static str>, rows: Vec<Map<String, Value>>) -> StepExecutor {
        let llm: Arc<dyn LanguageModel> = Arc::new(FakeModel {
            names,
            reply: "merged answer",
        });
        let store: Arc<dyn GraphStore> = Arc::new(FakeStore { rows });
        let extractor = Arc::new(EntityExtractor::new(llm.clone()));
        let structured = crate::retrieval::StructuredRetriever::new(
            store.clone(),
            extractor.clone(),
            50,
        );
        let retriever = Arc::new(HybridRetriever::new(structured, Arc::new(EmptyVector), 2));
        StepExecutor::new(retriever, extractor, store, llm, 5)
    }

    fn step(id: &str, query_type: QueryType) -> ExecutionStep {
        ExecutionStep {
            step_id: id.to_string(),
            description: String::new(),
            query_type,
            parameters: HashMap::new(),
            dependencies: Vec::new(),
            expected_confidence: 90.0,
        }
    }

    #[tokio::test]
    async fn test_traverse_with_one_entity_is_soft_success() {
        let executor = executor(vec!["Dracula"], vec![]);
        let result = executor
            .execute(
                &step("t", QueryType::RelationshipTraverse),
                "Who is Dracula?",
                &[],
            )
            .await;

        assert!(result.success);
        assert_eq!(result.summary, "not enough entities to find a path");
        assert_eq!(result.data["paths"], json!([]));
        assert_eq!(result.confidence, EMPTY_PATH_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_traverse_with_two_entities_returns_paths() {
        let mut row = Map::new();
        row.insert("nodes".to_string(), json!(["Dracula", "Mina"]));
        row.insert("relationships".to_string(), json!(["PURSUES"]));

        let executor = executor(vec!["Dracula", "Mina"], vec![row]);
        let result = executor
            .execute(
                &step("t", QueryType::RelationshipTraverse),
                "How does Dracula influence Mina?",
                &[],
            )
            .await;

        assert!(result.success);
        assert_eq!(result.data["paths"][0]["relationships"], json!(["PURSUES"]));
        assert!(result.summary.contains("Dracula"));
    }

    #[tokio::test]
    async fn test_unknown_type_is_failed_result_not_panic() {
        let executor = executor(vec![], vec![]);
        let result = executor
            .execute(
                &step("v", QueryType::Other("graph_update".to_string())),
                "query",
                &[],
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.confidence, 0.0);
        assert!(result.summary.contains("graph_update"));
        assert!(result.data["error"].is_string());
    }

    #[tokio::test]
    async fn test_validation_type_fails_at_dispatch() {
        let executor = executor(vec![], vec![]);
        let result = executor
            .execute(&step("v", QueryType::Validation), "query", &[])
            .await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_synthesis_reads_only_successful_history() {
        let executor = executor(vec![], vec![]);

        let history = vec![
            StepResult {
                step_id: "a".to_string(),
                success: true,
                data: json!({"result": "fact one"}),
                confidence: 80.0,
                summary: "a done".to_string(),
                sources: vec!["knowledge graph".to_string()],
                execution_time: Duration::from_millis(1),
            },
            StepResult::failure("b", "boom".to_string(), Duration::from_millis(1)),
        ];

        let result = executor
            .execute(&step("s", QueryType::Synthesis), "query", &history)
            .await;

        assert!(result.success);
        assert_eq!(result.data["synthesis"], "merged answer");
        assert_eq!(result.summary, "synthesized findings from 1 prior steps");
        assert_eq!(result.sources, vec!["knowledge graph"]);
    }

    #[tokio::test]
    async fn test_entity_search_wraps_result() {
        let mut row = Map::new();
        row.insert(
            "output".to_string(),
            json!("Dracula (N/A) -[FEARS]-> Crucifix (N/A)"),
        );

        let executor = executor(vec!["Dracula"], vec![row]);
        let mut search = step("e", QueryType::EntitySearch);
        search
            .parameters
            .insert("entities".to_string(), json!(["Dracula"]));

        let result = executor.execute(&search, "Who is Dracula?", &[]).await;

        assert!(result.success);
        assert!(result.data["result"]
            .as_str()
            .unwrap()
            .contains("-[FEARS]->"));
        assert_eq!(result.confidence, 90.0);
    }

    #[tokio::test]
    async fn test_execution_time_recorded() {
        let executor = executor(vec![], vec![]);
        let result = executor
            .execute(&step("v", QueryType::Validation), "query", &[])
            .await;
        // Failure path still records wall-clock timing
        assert!(result.execution_time >= Duration::ZERO);
    }
}
