//! GraphRAG API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Query routing into the agentic engine
//! - Conversation lifecycle (reset)
//! - Observability (logging, metrics, tracing)

mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use graphrag_common::{
    config::AppConfig,
    embeddings::OpenAIEmbedder,
    graph::{GraphStore, Neo4jHttpStore},
    llm::{ChatClient, LanguageModel},
    metrics,
    vector::Neo4jVectorIndex,
};
use graphrag_engine::{
    AgenticEngine, ComplexityClassifier, EntityExtractor, HybridRetriever, QueryPlanner,
    ResultSynthesizer, StepExecutor, StructuredRetriever,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// The engine owns conversation state, so answers are serialized
    pub engine: Arc<Mutex<AgenticEngine>>,
    pub graph: Arc<dyn GraphStore>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    // Initialize tracing
    let filter = EnvFilter::new(&config.observability.log_level);
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("Starting GraphRAG API Gateway v{}", graphrag_common::VERSION);

    let config = Arc::new(config);

    // Initialize metrics
    if config.observability.metrics_port > 0 {
        let metrics_addr =
            SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                metrics::LATENCY_BUCKETS,
            )?
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();

    // Create app state
    let state = build_state(config.clone())?;

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wire the engine and its collaborators from configuration
fn build_state(config: Arc<AppConfig>) -> Result<AppState, Box<dyn std::error::Error>> {
    let llm: Arc<dyn LanguageModel> = Arc::new(ChatClient::new(config.llm.clone())?);
    let graph: Arc<dyn GraphStore> = Arc::new(Neo4jHttpStore::new(&config.graph)?);
    let embedder = Arc::new(OpenAIEmbedder::new(&config.vector)?);
    let vector = Arc::new(Neo4jVectorIndex::new(graph.clone(), embedder));

    let extractor = Arc::new(EntityExtractor::new(llm.clone()));
    let retriever = Arc::new(HybridRetriever::new(
        StructuredRetriever::new(
            graph.clone(),
            extractor.clone(),
            config.engine.neighborhood_limit,
        ),
        vector,
        config.vector.top_k,
    ));

    let engine = AgenticEngine::new(
        ComplexityClassifier::new(config.engine.simple_word_limit),
        retriever.clone(),
        QueryPlanner::new(llm.clone()),
        StepExecutor::new(
            retriever,
            extractor,
            graph.clone(),
            llm.clone(),
            config.engine.max_path_hops,
        ),
        ResultSynthesizer::new(llm.clone()),
        llm,
    );

    Ok(AppState {
        config,
        engine: Arc::new(Mutex::new(engine)),
        graph,
    })
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Query endpoints
        .route("/query", post(handlers::query::query))
        .route("/reset", post(handlers::query::reset));

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
