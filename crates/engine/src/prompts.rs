//! Prompt templates for the query engine

use crate::types::ComplexityAnalysis;

/// System instruction for entity extraction
pub const ENTITY_SYSTEM_PROMPT: &str = "You are extracting pronoun entities from the text, \
such as people, places, and organizations. If the entities are not in english, translate \
to english. Return a JSON object of the form {\"names\": [\"...\"]}.";

/// Human template for entity extraction
pub fn entity_input(text: &str) -> String {
    format!(
        "Use the given format to extract information from the following input: {}",
        text
    )
}

/// Planning prompt asking the model for a JSON execution plan
pub fn planning_prompt(query: &str, complexity: &ComplexityAnalysis) -> String {
    let flags = serde_json::to_string_pretty(complexity).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are a query planner for a GraphRAG system with a generic knowledge graph.

Query: {query}
Complexity Analysis: {flags}

Create a step-by-step execution plan. Consider:
- Entity extraction and search from the query
- Relationship traversal in the knowledge graph
- Multi-hop reasoning across connected concepts
- Synthesis of findings from multiple sources

Return a JSON plan with steps, each having:
- step_id: unique identifier
- description: what this step does
- query_type: one of ["entity_search", "relationship_traverse", "synthesis", "validation"]
- parameters: specific parameters for this step
- dependencies: list of step_ids this depends on
- expected_confidence: 0-100 estimate

Example format:
{{
    "steps": [
        {{
            "step_id": "extract_entities",
            "description": "Extract key entities and concepts from the query",
            "query_type": "entity_search",
            "parameters": {{"entities": ["concept1", "concept2"]}},
            "dependencies": [],
            "expected_confidence": 90
        }}
    ],
    "confidence_estimate": 85,
    "estimated_time": 10.5
}}"#
    )
}

/// Prompt for the simple retrieval path: answer only from context
pub fn rag_prompt(question: &str, context: &str) -> String {
    format!(
        "Answer the question based only on the following context. \
         If the context does not contain the answer, say so; do not make up information. \
         Use natural language and be concise.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}

/// Prompt merging prior step findings into one answer
pub fn synthesis_prompt(question: &str, findings: &str) -> String {
    format!(
        "You are synthesizing findings from a multi-step knowledge graph investigation.\n\n\
         Original question: {question}\n\n\
         Findings from executed steps:\n{findings}\n\n\
         Produce one comprehensive answer to the original question grounded in the \
         findings above. Note any gaps the findings leave open."
    )
}
