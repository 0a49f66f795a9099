//! HTTP request handlers for the concierge API

use crate::catalog::{JsonFileStore, ListingStore};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::models::{CompletionClient, FallbackChain, GeminiClient};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod extractor;
pub mod health;
pub mod metrics;

/// Application state shared across all handlers
///
/// Everything is read-only or internally synchronized, and every field is
/// an `Arc`, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn ListingStore>,
    /// `None` when the upstream credential was absent at startup
    client: Option<Arc<dyn CompletionClient>>,
    chain: Arc<FallbackChain>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create state from configuration
    ///
    /// Reads the upstream credential from the environment once. A missing
    /// credential does not prevent startup; chat requests answer with a
    /// generic failure until the process is restarted with it set.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let key_env = config.upstream.api_key_env();
        let client: Option<Arc<dyn CompletionClient>> = match std::env::var(key_env) {
            Ok(key) if !key.trim().is_empty() => {
                Some(Arc::new(GeminiClient::new(&config.upstream, key)?))
            }
            _ => {
                tracing::warn!(
                    api_key_env = %key_env,
                    "Upstream credential is not set; chat requests will fail until it is configured"
                );
                None
            }
        };

        let store: Arc<dyn ListingStore> = Arc::new(JsonFileStore::new(
            config.catalog.hotels_path.clone(),
            config.catalog.packages_path.clone(),
        ));

        Self::with_components(config, store, client)
    }

    /// Create state with explicit collaborators
    pub fn with_components(
        config: Arc<Config>,
        store: Arc<dyn ListingStore>,
        client: Option<Arc<dyn CompletionClient>>,
    ) -> AppResult<Self> {
        let policy = config.retry.policy()?;
        let chain = Arc::new(FallbackChain::new(config.upstream.model_names(), policy));
        let metrics = Metrics::new().map_err(|e| {
            AppError::Internal(format!("Failed to initialize metrics registry: {}", e))
        })?;

        Ok(Self {
            config,
            store,
            client,
            chain,
            metrics: Arc::new(metrics),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn ListingStore {
        self.store.as_ref()
    }

    pub fn client(&self) -> Option<&Arc<dyn CompletionClient>> {
        self.client.as_ref()
    }

    /// Whether an upstream credential was found at startup
    pub fn has_credential(&self) -> bool {
        self.client.is_some()
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the HTTP router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
