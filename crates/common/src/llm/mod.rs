//! Language model client abstraction
//!
//! Provides a unified interface over OpenAI-compatible chat completion
//! APIs (OpenRouter, OpenAI, Ollama's /v1 endpoint). Callers receive
//! either plain text or a tagged [`ModelResponse`] that preserves the
//! shape the model actually answered with (structured object, tool call
//! or free text), so downstream parsing can degrade explicitly instead
//! of probing.

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Response from a structured-output invocation
///
/// The underlying model may honor a structured-output request, answer
/// with a tool call, or fall back to free text. The variant records
/// which happened.
// Adjacently tagged: internal tagging cannot represent newtype variants
// holding strings or arrays, and would splice a "kind" key into the
// Structured payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ModelResponse {
    /// Model returned a parsed structured object
    Structured(Value),

    /// Model answered with a tool call
    ToolCall {
        /// Tool name
        name: String,
        /// Parsed tool arguments
        arguments: Value,
    },

    /// Free-form text answer
    Text(String),
}

/// Trait for language model invocation
///
/// Implementations must be safe to call from spawned background tasks;
/// all methods are async-suspending and never block the executor.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Invoke the model with a plain prompt, returning raw text
    async fn invoke(&self, prompt: &str) -> Result<String>;

    /// Invoke the model with a system instruction, requesting structured
    /// output; the response preserves the shape the model answered with
    async fn invoke_structured(&self, system: &str, input: &str) -> Result<ModelResponse>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible chat completions client
pub struct ChatClient {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallPayload>>,
}

#[derive(Deserialize)]
struct ToolCallPayload {
    function: ToolFunction,
}

#[derive(Deserialize)]
struct ToolFunction {
    name: String,
    /// Arguments arrive as a JSON-encoded string per the OpenAI wire format
    arguments: String,
}

impl ChatClient {
    /// Create a new chat client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<ChatResponseMessage> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let api_key = self.config.api_key.clone().unwrap_or_default();

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
        };

        // Retries live here, inside the per-call client; the engine never
        // retries a failed step itself
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(200))
            .with_max_elapsed_time(Some(Duration::from_secs(
                self.config.timeout_secs * u64::from(self.config.max_retries),
            )))
            .build();

        let response = backoff::future::retry(backoff, || async {
            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", api_key))
                .json(&request)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(AppError::from(e)))?;

            let status = resp.status();
            if status.is_server_error() || status.as_u16() == 429 {
                let body = resp.text().await.unwrap_or_default();
                return Err(backoff::Error::transient(AppError::LlmError {
                    message: format!("API error {}: {}", status, body),
                }));
            }
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(backoff::Error::permanent(AppError::LlmError {
                    message: format!("API error {}: {}", status, body),
                }));
            }

            let parsed: ChatResponse = resp
                .json()
                .await
                .map_err(|e| backoff::Error::permanent(AppError::from(e)))?;

            parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message)
                .ok_or_else(|| {
                    backoff::Error::permanent(AppError::LlmError {
                        message: "Empty response from language model".to_string(),
                    })
                })
        })
        .await?;

        metrics::counter!("graphrag_llm_calls_total").increment(1);

        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let message = self
            .chat(vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }])
            .await?;

        message.content.ok_or_else(|| AppError::LlmError {
            message: "Model returned no text content".to_string(),
        })
    }

    async fn invoke_structured(&self, system: &str, input: &str) -> Result<ModelResponse> {
        let message = self
            .chat(vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: input.to_string(),
                },
            ])
            .await?;

        // A tool call wins over text content
        if let Some(calls) = message.tool_calls {
            if let Some(call) = calls.into_iter().next() {
                let arguments: Value = serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments));
                return Ok(ModelResponse::ToolCall {
                    name: call.function.name,
                    arguments,
                });
            }
        }

        let content = message.content.unwrap_or_default();

        // Models that honor structured output answer with a bare JSON object
        if let Ok(value) = serde_json::from_str::<Value>(content.trim()) {
            if value.is_object() || value.is_array() {
                return Ok(ModelResponse::Structured(value));
            }
        }

        Ok(ModelResponse::Text(content))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Strip `<think>...</think>` blocks that reasoning models prepend,
/// returning (thinking, answer). The answer always has the blocks removed.
pub fn split_thinking(response: &str) -> (Option<String>, String) {
    let re = regex_lite::Regex::new(r"(?is)<think>(.*?)</think>").expect("static pattern");

    let thinking = re
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());

    let answer = re.replace_all(response, "").trim().to_string();

    (thinking, answer)
}
