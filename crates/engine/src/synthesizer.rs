//! Result synthesis
//!
//! Merges successful step outputs into one final answer with an
//! aggregated confidence and deduplicated sources. An all-failed input
//! is a hard failure for the caller; no model call is made in that
//! case.

use crate::prompts;
use crate::types::{FinalResult, StepResult};
use graphrag_common::errors::{AppError, Result};
use graphrag_common::llm::{split_thinking, LanguageModel};
use std::collections::HashSet;
use std::sync::Arc;

/// Synthesizes a final result from step results
pub struct ResultSynthesizer {
    llm: Arc<dyn LanguageModel>,
}

impl ResultSynthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Merge the successful subset of `results` into a final answer
    pub async fn synthesize(
        &self,
        results: &[StepResult],
        original_query: &str,
    ) -> Result<FinalResult> {
        let successful: Vec<&StepResult> = results.iter().filter(|r| r.success).collect();

        if successful.is_empty() {
            return Err(AppError::NoSuccessfulSteps);
        }

        // Case-sensitive union, preserving execution order
        let mut seen = HashSet::new();
        let sources: Vec<String> = successful
            .iter()
            .flat_map(|r| r.sources.iter())
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect();

        let reasoning_chain: Vec<String> =
            successful.iter().map(|r| r.summary.clone()).collect();

        let confidence = successful.iter().map(|r| r.confidence).sum::<f32>()
            / successful.len() as f32;

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

        let failures = results.len() - successful.len();
        let limitations = (failures > 0).then(|| {
            format!(
                "{} of {} plan steps failed; the answer draws on partial results",
                failures,
                results.len()
            )
        });

        Ok(FinalResult {
            answer,
            confidence,
            sources,
            limitations,
            reasoning_chain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use graphrag_common::llm::ModelResponse;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingModel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for CountingModel {
        async fn invoke(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("final answer".to_string())
        }

        async fn invoke_structured(&self, _system: &str, _input: &str) -> Result<ModelResponse> {
            Ok(ModelResponse::Text(String::new()))
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn success(id: &str, confidence: f32, sources: &[&str]) -> StepResult {
        StepResult {
            step_id: id.to_string(),
            success: true,
            data: json!({"result": format!("data from {id}")}),
            confidence,
            summary: format!("{id} summary"),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            execution_time: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_confidence_is_mean_of_successes() {
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let synthesizer = ResultSynthesizer::new(model);

        let results = vec![
            success("a", 80.0, &["graph"]),
            success("b", 60.0, &["graph"]),
        ];
        let final_result = synthesizer.synthesize(&results, "question").await.unwrap();

        assert_eq!(final_result.confidence, 70.0);
        assert_eq!(final_result.answer, "final answer");
    }

    #[tokio::test]
    async fn test_all_failed_raises_without_model_call() {
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let synthesizer = ResultSynthesizer::new(model.clone());

        let results = vec![
            StepResult::failure("a", "boom".to_string(), Duration::from_millis(1)),
            StepResult::failure("b", "bust".to_string(), Duration::from_millis(1)),
        ];
        let err = synthesizer.synthesize(&results, "question").await.unwrap_err();

        assert!(matches!(err, AppError::NoSuccessfulSteps));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sources_deduplicated_case_sensitive() {
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let synthesizer = ResultSynthesizer::new(model);

        let results = vec![
            success("a", 50.0, &["chapter 1", "Chapter 1"]),
            success("b", 50.0, &["chapter 1", "chapter 2"]),
        ];
        let final_result = synthesizer.synthesize(&results, "question").await.unwrap();

        assert_eq!(
            final_result.sources,
            vec!["chapter 1", "Chapter 1", "chapter 2"]
        );
    }

    #[tokio::test]
    async fn test_reasoning_chain_preserves_order_and_skips_failures() {
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let synthesizer = ResultSynthesizer::new(model);

        let results = vec![
            success("a", 50.0, &[]),
            StepResult::failure("x", "boom".to_string(), Duration::from_millis(1)),
            success("b", 50.0, &[]),
        ];
        let final_result = synthesizer.synthesize(&results, "question").await.unwrap();

        assert_eq!(final_result.reasoning_chain, vec!["a summary", "b summary"]);
        assert!(final_result.limitations.is_some());
    }
}
