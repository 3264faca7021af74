//! GraphRAG Query Engine
//!
//! Agentic query execution over a knowledge graph plus vector store:
//! - Complexity classification routes each query to a path
//! - Simple queries run one hybrid retrieval into a RAG prompt
//! - Complex queries are planned, executed step by step, and synthesized
//! - Recoverable complex-path failures fall back to the simple path

pub mod classifier;
pub mod engine;
pub mod executor;
pub mod extractor;
pub mod planner;
pub mod prompts;
pub mod retrieval;
pub mod synthesizer;
pub mod types;
pub mod validator;

pub use classifier::ComplexityClassifier;
pub use engine::{AgenticEngine, EngineResponse, StepSink};
pub use executor::StepExecutor;
pub use extractor::EntityExtractor;
pub use planner::QueryPlanner;
pub use retrieval::{HybridRetriever, StructuredRetriever};
pub use synthesizer::ResultSynthesizer;
pub use types::{
    ComplexityAnalysis, Entities, ExecutionPlan, ExecutionStep, FinalResult, QueryType, StepResult,
};
pub use validator::ResponseValidator;
