//! API routes for the layout server

pub mod layout;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Routes mounted at the root; `/embed` is the path the front end posts to
pub fn root_routes() -> Router<AppState> {
    Router::new().route("/embed", post(layout::compute_layout))
}

/// Routes mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/layout", post(layout::compute_layout))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::Json<serde_json::Value> {
    let pipeline = state.pipeline();
    axum::Json(serde_json::json!({
        "name": "reqmap",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Clustered 2D maps of requirement texts",
        "providers": {
            "embeddings": pipeline.embedder().name(),
            "naming": pipeline.namer().name(),
        },
        "endpoints": {
            "POST /embed": "Embed, project, cluster and name requirements",
            "POST /api/layout": "Same as POST /embed",
            "GET /api/info": "Service description",
            "GET /health": "Liveness check",
            "GET /ready": "Provider readiness check"
        }
    }))
}
