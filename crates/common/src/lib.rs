//! GraphRAG Common Library
//!
//! Shared code for the GraphRAG services including:
//! - Error types and handling
//! - Configuration management
//! - Language model client abstraction
//! - Graph store and vector index access
//! - Embedding client abstraction
//! - Conversation memory
//! - Metrics and observability

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod metrics;
pub mod vector;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use graph::GraphStore;
pub use llm::{LanguageModel, ModelResponse};
pub use memory::ConversationState;
pub use vector::{Passage, VectorIndex};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the full-text index over graph node ids
pub const ENTITY_INDEX: &str = "entity";

/// Name of the vector index over passage embeddings
pub const VECTOR_INDEX: &str = "vector";

/// Relationship type excluded from neighborhood traversal
pub const MENTIONS_REL: &str = "MENTIONS";
