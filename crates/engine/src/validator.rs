//! Step result validation
//!
//! Heuristic quality score for a step result, used for logging and
//! diagnostics only; it does not gate execution or weight the final
//! confidence.

use crate::types::StepResult;

/// Scores step results on a 0-100 scale
#[derive(Debug, Clone, Default)]
pub struct ResponseValidator;

impl ResponseValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate individual step result quality
    ///
    /// Weighted factors: substantial content 0.3, sources present 0.2,
    /// execution success 0.3, reported confidence up to 0.2.
    pub fn validate_step(&self, result: &StepResult) -> f32 {
        let mut score = 0.0;

        if result.data.to_string().len() > 50 {
            score += 0.3;
        }

        if !result.sources.is_empty() {
            score += 0.2;
        }

        if result.success {
            score += 0.3;
        }

        score += result.confidence / 100.0 * 0.2;

        score * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_full_marks() {
        let result = StepResult {
            step_id: "a".to_string(),
            success: true,
            data: json!({"result": "a long enough payload with plenty of content in it"}),
            confidence: 100.0,
            summary: "done".to_string(),
            sources: vec!["knowledge graph".to_string()],
            execution_time: Duration::from_millis(5),
        };
        assert_eq!(ResponseValidator::new().validate_step(&result), 100.0);
    }

    #[test]
    fn test_failed_empty_step_scores_low() {
        let result = StepResult::failure("a", "x".to_string(), Duration::from_millis(1));
        let score = ResponseValidator::new().validate_step(&result);
        assert!(score < 30.0);
    }
}
