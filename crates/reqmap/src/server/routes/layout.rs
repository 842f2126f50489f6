//! Layout endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{LayoutRequest, LayoutResponse};

/// POST /embed, POST /api/layout
pub async fn compute_layout(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<LayoutResponse>> {
    tracing::info!("Layout request with {} requirements", request.requirements.len());

    let response = state
        .pipeline()
        .compute_clustered_layout(&request.requirements)
        .await?;

    Ok(Json(response))
}
