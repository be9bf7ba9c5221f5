//! Nova-Memory - memory-augmented chat backend
//!
//! Standalone HTTP service wrapping the memory engine: management commands
//! short-circuit the turn, everything else is grounded generation with a
//! save decision applied afterwards.

use anyhow::Result;
use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::limit::ConcurrencyLimitLayer;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tracing::{error, info};

use nova_memory::chat::{ChatEngine, ChatReply};
use nova_memory::config::ServerConfig;
use nova_memory::embeddings::HashEmbedder;
use nova_memory::errors::{AppError, ValidationErrorExt};
use nova_memory::generation::{ChatMessage, OllamaGenerator};
use nova_memory::index::InMemoryIndex;
use nova_memory::memory::MemoryStore;
use nova_memory::validation;

type AppState = Arc<ChatEngine>;

/// Request for the /chat endpoint
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// Conversation so far, oldest first; the last entry is the current turn
    messages: Vec<ChatMessage>,
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    features: Vec<&'static str>,
}

/// Main chat endpoint
///
/// The response shape is `{role: "assistant", content}` on every path,
/// including turn failures, which carry a plain-language message.
async fn chat(
    State(engine): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let user_id = req.user_id.unwrap_or_else(|| "1".to_string());
    validation::validate_user_id(&user_id).map_validation_err("user_id")?;

    let Some((current, transcript)) = req.messages.split_last() else {
        return Err(AppError::InvalidInput {
            field: "messages".to_string(),
            reason: "no messages provided".to_string(),
        });
    };
    validation::validate_content(&current.content).map_validation_err("messages")?;

    match engine
        .handle_turn(&user_id, &current.content, transcript.to_vec())
        .await
    {
        Ok(reply) => Ok(Json(reply).into_response()),
        Err(e) => {
            error!(user_id, error = %e, "chat turn failed");
            Ok((e.status_code(), Json(ChatReply::assistant(e.user_message()))).into_response())
        }
    }
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "nova-memory",
        version: env!("CARGO_PKG_VERSION"),
        features: vec![
            "chat",
            "memory_save",
            "memory_forget",
            "memory_list",
            "memory_search",
            "memory_count",
            "memory_clear",
        ],
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting nova-memory server...");

    let config = ServerConfig::from_env();
    config.log();

    let embedder = Arc::new(HashEmbedder::new(config.store.embedding_dimension));
    let index = Arc::new(InMemoryIndex::new());
    let store = Arc::new(MemoryStore::new(index, embedder, config.store.clone()));

    // Idempotent collection bootstrap on every start
    store.bootstrap()?;
    info!("Vector collection ready");

    let generator = Arc::new(OllamaGenerator::new(
        config.generation_url.clone(),
        config.generation_model.clone(),
    ));
    let engine = Arc::new(ChatEngine::new(store, generator, config.grounding_top_k));

    // Rate limiting per client
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(config.rate_limit_per_second)
        .burst_size(config.rate_limit_burst)
        .finish()
        .expect("Failed to build rate limiter configuration");
    let governor_layer = GovernorLayer::new(governor_conf);

    info!(
        "Rate limiting enabled: {} req/sec, burst of {}",
        config.rate_limit_per_second, config.rate_limit_burst
    );

    let cors = config.cors.to_layer();

    // Health is not rate limited; the chat endpoint is
    let protected_routes = Router::new()
        .route("/chat", post(chat))
        .layer(governor_layer)
        .with_state(engine.clone());

    let public_routes = Router::new().route("/health", get(health));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
