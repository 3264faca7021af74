//! Query orchestration
//!
//! Owns one conversation and drives a query through classification,
//! then either single-shot retrieval or the plan/execute/synthesize
//! path. Complex-path failures that make synthesis impossible are
//! caught here and retried through the simple path; the caller only
//! ever sees an answer or a plain failure notice.

use crate::classifier::ComplexityClassifier;
use crate::planner::QueryPlanner;
use crate::prompts;
use crate::retrieval::HybridRetriever;
use crate::synthesizer::ResultSynthesizer;
use crate::executor::StepExecutor;
use crate::types::{ComplexityAnalysis, StepResult};
use crate::validator::ResponseValidator;
use graphrag_common::errors::Result;
use graphrag_common::llm::{split_thinking, LanguageModel};
use graphrag_common::ConversationState;
use std::sync::Arc;
use std::time::Instant;

/// Notice returned when both the complex path and its fallback fail
const FAILURE_NOTICE: &str =
    "I was unable to answer that question right now. Please try rephrasing it.";

/// Sink for per-step progress annotations
///
/// The transport layer may surface these as reasoning steps; the engine
/// only guarantees the order matches execution order.
pub trait StepSink: Send + Sync {
    fn on_step(&self, description: &str, summary: &str, success: bool);
}

/// Final answer handed to the transport
#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineResponse {
    pub answer: String,

    /// Aggregated confidence 0-100; absent on the simple path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    pub sources: Vec<String>,

    pub reasoning_chain: Vec<String>,

    /// Which path produced the answer
    pub planned: bool,
}

/// The agentic GraphRAG orchestrator
///
/// Exclusively owns its conversation state and the per-turn execution
/// history; collaborators are stateless with respect to a given query
/// and shared behind `Arc`.
pub struct AgenticEngine {
    classifier: ComplexityClassifier,
    retriever: Arc<HybridRetriever>,
    planner: QueryPlanner,
    executor: StepExecutor,
    synthesizer: ResultSynthesizer,
    validator: ResponseValidator,
    llm: Arc<dyn LanguageModel>,
    conversation: ConversationState,
    sink: Option<Arc<dyn StepSink>>,
}

impl AgenticEngine {
    pub fn new(
        classifier: ComplexityClassifier,
        retriever: Arc<HybridRetriever>,
        planner: QueryPlanner,
        executor: StepExecutor,
        synthesizer: ResultSynthesizer,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            classifier,
            retriever,
            planner,
            executor,
            synthesizer,
            validator: ResponseValidator::new(),
            llm,
            conversation: ConversationState::new(),
            sink: None,
        }
    }

    /// Attach a progress sink
    pub fn with_sink(mut self, sink: Arc<dyn StepSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Answer one query, recording the turn in conversation state
    pub async fn answer(&mut self, query: &str) -> EngineResponse {
        let start = Instant::now();
        metrics::counter!("graphrag_queries_total").increment(1);

        let analysis = self.classifier.classify(query, &self.conversation);
        tracing::info!(
            query = %query,
            is_simple = analysis.is_simple,
            context_dependent = analysis.context_dependent,
            "query classified"
        );

        let response = if analysis.is_simple {
            self.simple_path(query).await
        } else {
            metrics::counter!("graphrag_complex_queries_total").increment(1);
            match self.complex_path(query, &analysis).await {
                Ok(response) => Ok(response),
                Err(e) => {
                    // Every complex-path error is recoverable at this level,
                    // whether it came from planning or from synthesis
                    tracing::warn!(error = %e, "complex path failed, falling back to simple retrieval");
                    metrics::counter!("graphrag_fallbacks_total").increment(1);
                    self.simple_path(query).await
                }
            }
        };

        metrics::histogram!("graphrag_query_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        let response = response.unwrap_or_else(|e| {
            tracing::error!(error = %e, "both answer paths failed");
            EngineResponse {
                answer: FAILURE_NOTICE.to_string(),
                confidence: None,
                sources: Vec::new(),
                reasoning_chain: Vec::new(),
                planned: false,
            }
        });

        self.conversation.append(query, &response.answer);
        response
    }

    /// Reset the conversation buffer
    pub fn reset(&mut self) {
        self.conversation.clear();
    }

    /// Number of messages in the conversation buffer
    pub fn conversation_len(&self) -> usize {
        self.conversation.len()
    }

    /// Single-shot retrieval: hybrid context into one RAG prompt
    async fn simple_path(&self, query: &str) -> Result<EngineResponse> {
        let context = self.retriever.retrieve(query).await?;
        let response = self.llm.invoke(&prompts::rag_prompt(query, &context)).await?;
        let (_, answer) = split_thinking(&response);

        Ok(EngineResponse {
            answer,
            confidence: None,
            sources: Vec::new(),
            reasoning_chain: Vec::new(),
            planned: false,
        })
    }

    /// Plan, execute steps sequentially, synthesize
    async fn complex_path(
        &self,
        query: &str,
        analysis: &ComplexityAnalysis,
    ) -> Result<EngineResponse> {
        let plan = self.planner.plan(query, analysis).await?;

        // One history per turn, append-only; later synthesis steps read
        // it, so steps run strictly in declared order
        let mut history: Vec<StepResult> = Vec::with_capacity(plan.steps.len());

        for step in &plan.steps {
            let result = self.executor.execute(step, query, &history).await;

            let quality = self.validator.validate_step(&result);
            tracing::debug!(
                step_id = %result.step_id,
                success = result.success,
                confidence = result.confidence,
                quality,
                elapsed_ms = result.execution_time.as_millis() as u64,
                "step recorded"
            );

            if let Some(sink) = &self.sink {
                sink.on_step(&step.description, &result.summary, result.success);
            }

            history.push(result);
        }

        let final_result = self.synthesizer.synthesize(&history, query).await?;

        Ok(EngineResponse {
            answer: final_result.answer,
            confidence: Some(final_result.confidence),
            sources: final_result.sources,
            reasoning_chain: final_result.reasoning_chain,
            planned: true,
        })
    }
}
