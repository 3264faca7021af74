//! Query handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::AppState;
use graphrag_common::errors::{AppError, Result};

const MAX_QUERY_LEN: usize = 1000;

/// Query request
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Query response
#[derive(Serialize)]
pub struct QueryResponse {
    pub answer: String,

    /// Aggregated confidence 0-100; absent on the simple path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    pub sources: Vec<String>,

    pub reasoning_chain: Vec<String>,

    /// Whether the answer came through the planned path
    pub planned: bool,

    pub processing_time_ms: u64,
}

/// Reset response
#[derive(Serialize)]
pub struct ResetResponse {
    pub status: String,
}

/// Answer one query within the ongoing conversation
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();

    let question = request.query.trim();
    if question.is_empty() {
        return Err(AppError::Validation {
            message: "query must not be empty".to_string(),
        });
    }
    if question.len() > MAX_QUERY_LEN {
        return Err(AppError::Validation {
            message: format!("query must be at most {MAX_QUERY_LEN} characters"),
        });
    }

    let response = state.engine.lock().await.answer(question).await;

    Ok(Json(QueryResponse {
        answer: response.answer,
        confidence: response.confidence,
        sources: response.sources,
        reasoning_chain: response.reasoning_chain,
        planned: response.planned,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Clear the conversation buffer
pub async fn reset(State(state): State<AppState>) -> Json<ResetResponse> {
    state.engine.lock().await.reset();
    tracing::info!("conversation reset");

    Json(ResetResponse {
        status: "reset".to_string(),
    })
}
