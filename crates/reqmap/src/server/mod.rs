//! HTTP server for the requirement map

pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::ReqmapConfig;
use crate::error::{Error, Result};
use crate::providers::Providers;
use state::AppState;

/// Requirement map HTTP server
pub struct ReqmapServer {
    config: ReqmapConfig,
    state: AppState,
}

impl ReqmapServer {
    /// Create a server around already-constructed providers
    pub fn new(config: ReqmapConfig, providers: Providers) -> Self {
        let state = AppState::new(config.clone(), providers);
        Self { config, state }
    }

    /// Build providers from `config` and create the server
    pub fn from_config(config: ReqmapConfig) -> Result<Self> {
        let providers = Providers::from_config(&config)?;
        Ok(Self::new(config, providers))
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        tracing::info!("Starting requirement map server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Full router: health checks, `/embed`, `/api/*` and the static front end
pub fn build_router(state: AppState) -> Router {
    let server = &state.config().server;
    let max_body_size = server.max_body_size;
    let enable_cors = server.enable_cors;
    let static_dir = server.static_dir.clone();

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .merge(routes::root_routes())
        .nest("/api", routes::api_routes())
        .with_state(state);

    if let Some(dir) = static_dir {
        tracing::info!("Serving static files from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir));
    }

    // Layers apply bottom to top; CORS stays outermost.
    let router = router
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(state: axum::extract::State<AppState>) -> StatusCode {
    if state.is_ready().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
