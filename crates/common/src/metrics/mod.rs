//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{describe_counter, describe_histogram, Unit};

/// Metrics prefix for all GraphRAG metrics
pub const METRICS_PREFIX: &str = "graphrag";

/// Histogram buckets for query latency (in seconds); LLM-bound work is slow
pub const LATENCY_BUCKETS: &[f64] = &[
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
    30.00, // 30s
    60.00, // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Query metrics
    describe_counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of queries answered"
    );

    describe_counter!(
        format!("{}_complex_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Queries routed to the planning path"
    );

    describe_counter!(
        format!("{}_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Complex-path failures that fell back to simple retrieval"
    );

    describe_histogram!(
        format!("{}_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end query latency in seconds"
    );

    // Plan metrics
    describe_counter!(
        format!("{}_plan_steps_total", METRICS_PREFIX),
        Unit::Count,
        "Total plan steps executed"
    );

    describe_counter!(
        format!("{}_plan_step_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Plan steps that recorded a failure"
    );

    describe_histogram!(
        format!("{}_step_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Single step execution latency in seconds"
    );

    // Collaborator metrics
    describe_counter!(
        format!("{}_llm_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total language model invocations"
    );

    describe_counter!(
        format!("{}_graph_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total graph store queries"
    );

    describe_counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API requests"
    );
}
