//! Entity extraction
//!
//! Resolves named entities from free text via the language model's
//! structured-output capability. The model may answer with a structured
//! object, a tool call, or free text, so resolution degrades through an
//! ordered cascade; each stage runs only if the prior stage produced
//! zero names. Extraction is non-fatal: on any model error the cascade
//! falls through to a text heuristic over the original question.

use crate::prompts;
use crate::types::Entities;
use graphrag_common::llm::{LanguageModel, ModelResponse};
use std::collections::HashSet;
use std::sync::Arc;

/// Words never treated as entity candidates by the text heuristic
const HEURISTIC_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "what", "who", "where", "when", "why", "how", "is", "are", "was",
    "were", "does", "do", "did", "in", "on", "of", "and", "or", "but", "if", "this",
    "that", "these", "those", "describe", "trace", "compare", "analyze", "explain",
];

/// Extracts entity surface names from text
pub struct EntityExtractor {
    llm: Arc<dyn LanguageModel>,
}

impl EntityExtractor {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Extract entity names from the given text; never fails
    pub async fn extract(&self, text: &str) -> Entities {
        let response = self
            .llm
            .invoke_structured(prompts::ENTITY_SYSTEM_PROMPT, &prompts::entity_input(text))
            .await;

        let names = match response {
            Ok(response) => resolve_names(&response, text),
            Err(e) => {
                // Degraded extraction: fall straight to the question heuristic
                tracing::warn!(error = %e, "entity extraction degraded to text heuristic");
                capitalized_words(text)
            }
        };

        Entities {
            names: cleanup(names),
        }
    }
}

/// Ordered-cascade resolver over the tagged response shape
fn resolve_names(response: &ModelResponse, question: &str) -> Vec<String> {
    // Stage 1: structured `names` field
    if let ModelResponse::Structured(value) = response {
        let names = names_from_value(value);
        if !names.is_empty() {
            return names;
        }
    }

    // Stage 2: tool-call arguments named `names` or `entities`
    if let ModelResponse::ToolCall { name, arguments } = response {
        let mut names = names_from_value(arguments);
        if names.is_empty() && matches!(name.as_str(), "names" | "entities") {
            names = string_array(arguments);
        }
        if !names.is_empty() {
            return names;
        }
    }

    let text = match response {
        ModelResponse::Text(t) => t.as_str(),
        _ => return capitalized_words(question),
    };

    // Stage 3: JSON-looking content
    let names = json_stage(text);
    if !names.is_empty() {
        return names;
    }

    // Stage 4: regex over key-value and bracketed lists
    let names = regex_stage(text);
    if !names.is_empty() {
        return names;
    }

    // Stage 5: capitalized words in the raw response
    let names = capitalized_words(text);
    if !names.is_empty() {
        return names;
    }

    // Stage 6: last resort, the original question
    capitalized_words(question)
}

/// Pull a `names`/`entities` string array out of a JSON value
fn names_from_value(value: &serde_json::Value) -> Vec<String> {
    if let Some(object) = value.as_object() {
        for key in ["names", "entities"] {
            if let Some(field) = object.get(key) {
                let names = string_array(field);
                if !names.is_empty() {
                    return names;
                }
            }
        }
        return Vec::new();
    }

    string_array(value)
}

/// String entries of a JSON array; non-strings are dropped
fn string_array(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the content, or its first embedded object/array, as JSON
fn json_stage(text: &str) -> Vec<String> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return names_from_value(&value);
    }

    // The model often wraps JSON in prose; try the first embedded block
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if start < end {
                if let Ok(value) =
                    serde_json::from_str::<serde_json::Value>(&trimmed[start..=end])
                {
                    let names = names_from_value(&value);
                    if !names.is_empty() {
                        return names;
                    }
                }
            }
        }
    }

    Vec::new()
}

/// Match `entities:`/`names:` key-value lines and bracketed lists
fn regex_stage(text: &str) -> Vec<String> {
    let patterns = [
        r#"(?im)(?:entities|names)\s*[:=]\s*\[([^\]]+)\]"#,
        r#"(?im)(?:entities|names)\s*[:=]\s*([^\n\[]+)"#,
        r#"\[([^\]]+)\]"#,
    ];

    for pattern in patterns {
        let re = regex_lite::Regex::new(pattern).expect("static pattern");
        if let Some(captures) = re.captures(text) {
            if let Some(list) = captures.get(1) {
                let names: Vec<String> = list
                    .as_str()
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if !names.is_empty() {
                    return names;
                }
            }
        }
    }

    Vec::new()
}

/// Capitalized-word heuristic over arbitrary text
fn capitalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .collect::<String>()
        })
        .filter(|clean| {
            clean.len() > 1
                && clean.chars().next().is_some_and(|c| c.is_uppercase())
                && !HEURISTIC_STOP_WORDS.contains(&clean.to_lowercase().as_str())
        })
        .collect()
}

/// Trim quotes/punctuation, drop empties, dedup case-insensitively
/// preserving first-seen order
fn cleanup(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::new();

    for name in names {
        let trimmed = name
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '.' | ',' | ';' | ':' | '!' | '?'))
            .trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            result.push(trimmed.to_string());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use graphrag_common::errors::{AppError, Result};

    struct CannedModel {
        response: Result<ModelResponse>,
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn invoke(&self, _prompt: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn invoke_structured(&self, _system: &str, _input: &str) -> Result<ModelResponse> {
            match &self.response {
                Ok(r) => Ok(r.clone()),
                Err(_) => Err(AppError::LlmError {
                    message: "down".to_string(),
                }),
            }
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    async fn extract_with(response: Result<ModelResponse>, question: &str) -> Vec<String> {
        let extractor = EntityExtractor::new(Arc::new(CannedModel { response }));
        extractor.extract(question).await.names
    }

    #[tokio::test]
    async fn test_structured_stage() {
        let names = extract_with(
            Ok(ModelResponse::Structured(
                serde_json::json!({"names": ["Dracula", "Mina Harker"]}),
            )),
            "irrelevant",
        )
        .await;
        assert_eq!(names, vec!["Dracula", "Mina Harker"]);
    }

    #[tokio::test]
    async fn test_tool_call_stage() {
        let names = extract_with(
            Ok(ModelResponse::ToolCall {
                name: "entities".to_string(),
                arguments: serde_json::json!({"entities": ["Renfield"]}),
            }),
            "irrelevant",
        )
        .await;
        assert_eq!(names, vec!["Renfield"]);
    }

    #[tokio::test]
    async fn test_json_text_stage_without_fallthrough() {
        // A JSON string answer must resolve at the JSON stage, not the
        // regex or heuristic stages
        let names = extract_with(
            Ok(ModelResponse::Text(
                r#"{"entities":["Dracula","Mina"]}"#.to_string(),
            )),
            "Tell me about Someone Else",
        )
        .await;
        assert_eq!(names, vec!["Dracula", "Mina"]);
    }

    #[tokio::test]
    async fn test_json_embedded_in_prose() {
        let names = extract_with(
            Ok(ModelResponse::Text(
                "Here you go: {\"names\": [\"Lucy Westenra\"]} Hope that helps.".to_string(),
            )),
            "irrelevant",
        )
        .await;
        assert_eq!(names, vec!["Lucy Westenra"]);
    }

    #[tokio::test]
    async fn test_regex_stage() {
        let names = extract_with(
            Ok(ModelResponse::Text(
                "entities: [Jonathan Harker, Count Dracula]".to_string(),
            )),
            "irrelevant",
        )
        .await;
        assert_eq!(names, vec!["Jonathan Harker", "Count Dracula"]);
    }

    #[tokio::test]
    async fn test_response_heuristic_stage() {
        let names = extract_with(
            Ok(ModelResponse::Text(
                "the text mentions Renfield and also Seward".to_string(),
            )),
            "irrelevant",
        )
        .await;
        assert_eq!(names, vec!["Renfield", "Seward"]);
    }

    #[tokio::test]
    async fn test_question_fallback_on_model_error() {
        let names = extract_with(
            Err(AppError::LlmError {
                message: "down".to_string(),
            }),
            "What does Van Helsing know about Dracula?",
        )
        .await;
        assert_eq!(names, vec!["Van", "Helsing", "Dracula"]);
    }

    #[tokio::test]
    async fn test_dedup_is_case_insensitive_first_seen() {
        let names = extract_with(
            Ok(ModelResponse::Structured(
                serde_json::json!({"names": ["Dracula", "DRACULA", " dracula ", "Mina"]}),
            )),
            "irrelevant",
        )
        .await;
        assert_eq!(names, vec!["Dracula", "Mina"]);
    }

    #[tokio::test]
    async fn test_no_empty_names_survive() {
        let names = extract_with(
            Ok(ModelResponse::Structured(
                serde_json::json!({"names": ["", "  ", "\"\"", "Mina"]}),
            )),
            "irrelevant",
        )
        .await;
        assert_eq!(names, vec!["Mina"]);
    }

    #[test]
    fn test_quote_trimming() {
        let cleaned = cleanup(vec!["\"Dracula\"".to_string(), "'Mina',".to_string()]);
        assert_eq!(cleaned, vec!["Dracula", "Mina"]);
    }
}
