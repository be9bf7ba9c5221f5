//! Configuration management
//!
//! All configurable parameters in one place with environment variable
//! overrides. Sensible defaults, configurable in production.

use std::env;
use std::str::FromStr;
use tracing::info;

use crate::constants::DEFAULT_GROUNDING_TOP_K;
use crate::memory::StoreConfig;

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// CORS configuration
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Allowed origins (empty = allow all)
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(origins) = env::var("NOVA_CORS_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        config
    }

    /// Convert to tower-http CorsLayer
    pub fn to_layer(&self) -> tower_http::cors::CorsLayer {
        use tower_http::cors::{AllowOrigin, Any, CorsLayer};

        let layer = CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any);

        if self.allowed_origins.is_empty() {
            return layer.allow_origin(Any);
        }

        let mut valid_origins = Vec::new();
        for origin in &self.allowed_origins {
            match origin.parse::<axum::http::HeaderValue>() {
                Ok(value) => valid_origins.push(value),
                Err(_) => tracing::warn!("CORS: invalid origin '{}' - skipping", origin),
            }
        }
        layer.allow_origin(AllowOrigin::list(valid_origins))
    }
}

/// Server configuration loaded from environment with defaults
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (default: 127.0.0.1)
    pub host: String,
    /// Server port (default: 8001)
    pub port: u16,
    /// Store thresholds and embedding dimension
    pub store: StoreConfig,
    /// Grounding memories fetched per chat turn
    pub grounding_top_k: usize,
    /// Base URL of the generation endpoint (OpenAI-compatible)
    pub generation_url: Option<String>,
    /// Model name passed to the generation endpoint
    pub generation_model: String,
    /// Recognized for remote vector stores; the bundled index is in-process
    pub vector_index_endpoint: Option<String>,
    /// Rate limit: sustained requests per second per client
    pub rate_limit_per_second: u64,
    /// Rate limit: burst size per client
    pub rate_limit_burst: u32,
    /// Maximum concurrent in-flight requests
    pub max_concurrent_requests: usize,
    /// CORS settings
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
            store: StoreConfig::default(),
            grounding_top_k: DEFAULT_GROUNDING_TOP_K,
            generation_url: None,
            generation_model: "dolphin3:latest".to_string(),
            vector_index_endpoint: None,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
            max_concurrent_requests: 100,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let store_defaults = defaults.store.clone();

        Self {
            host: env::var("NOVA_HOST").unwrap_or(defaults.host),
            port: env_parse("NOVA_PORT", defaults.port),
            store: StoreConfig {
                embedding_dimension: env_parse(
                    "NOVA_EMBEDDING_DIMENSION",
                    store_defaults.embedding_dimension,
                ),
                duplicate_threshold: env_parse(
                    "NOVA_DUPLICATE_THRESHOLD",
                    store_defaults.duplicate_threshold,
                ),
                forget_threshold: env_parse(
                    "NOVA_FORGET_THRESHOLD",
                    store_defaults.forget_threshold,
                ),
            },
            grounding_top_k: env_parse("NOVA_GROUNDING_TOP_K", defaults.grounding_top_k),
            generation_url: env::var("NOVA_GENERATION_URL").ok(),
            generation_model: env::var("NOVA_GENERATION_MODEL")
                .unwrap_or(defaults.generation_model),
            vector_index_endpoint: env::var("NOVA_VECTOR_INDEX_ENDPOINT").ok(),
            rate_limit_per_second: env_parse(
                "NOVA_RATE_LIMIT_PER_SECOND",
                defaults.rate_limit_per_second,
            ),
            rate_limit_burst: env_parse("NOVA_RATE_LIMIT_BURST", defaults.rate_limit_burst),
            max_concurrent_requests: env_parse(
                "NOVA_MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            ),
            cors: CorsConfig::from_env(),
        }
    }

    /// Log the effective configuration at startup
    pub fn log(&self) {
        info!(host = %self.host, port = self.port, "server");
        info!(
            dimension = self.store.embedding_dimension,
            duplicate_threshold = self.store.duplicate_threshold,
            forget_threshold = self.store.forget_threshold,
            "memory store"
        );
        info!(
            grounding_top_k = self.grounding_top_k,
            model = %self.generation_model,
            url = %self.generation_url.as_deref().unwrap_or("(default)"),
            "generation"
        );
        if let Some(endpoint) = &self.vector_index_endpoint {
            info!(%endpoint, "vector index endpoint configured (in-process index bundled)");
        }
    }
}
