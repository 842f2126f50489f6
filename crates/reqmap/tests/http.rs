//! HTTP surface tests against the router, without a socket

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use common::*;
use reqmap::server::{build_router, state::AppState};
use reqmap::{LayoutPipeline, ReqmapConfig};

fn router(embedder: Arc<dyn reqmap::providers::EmbeddingProvider>) -> Router {
    let mut config = ReqmapConfig::default();
    config.server.static_dir = None;
    let pipeline = LayoutPipeline::new(
        embedder,
        Arc::new(EchoNamer::default()),
        config.layout.clone(),
    );
    build_router(AppState::with_pipeline(config, pipeline))
}

fn themed_router() -> Router {
    router(Arc::new(FixedEmbedder {
        vectors: themed_vectors(3, 4),
    }))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_embed_returns_points_and_clusters() {
    let body = serde_json::json!({ "requirements": themed_requirements() });
    let response = themed_router().oneshot(post_json("/embed", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    let points = json["points"].as_array().unwrap();
    assert_eq!(points.len(), 12);
    for key in ["text", "x", "y", "cluster"] {
        assert!(points[0].get(key).is_some(), "missing {}", key);
    }
    let clusters = json["clusters"].as_array().unwrap();
    assert_eq!(clusters.len(), 3);
    for key in ["id", "cx", "cy", "radius", "name"] {
        assert!(clusters[0].get(key).is_some(), "missing {}", key);
    }
}

#[tokio::test]
async fn test_api_layout_alias() {
    let body = serde_json::json!({ "requirements": themed_requirements() });
    let response = themed_router()
        .oneshot(post_json("/api/layout", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_requirements_is_bad_request() {
    let response = themed_router()
        .oneshot(post_json("/embed", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "No requirements provided");
    assert_eq!(json["kind"], "validation_error");
}

#[tokio::test]
async fn test_embedding_outage_is_bad_gateway() {
    let body = serde_json::json!({ "requirements": ["Users log in"] });
    let response = router(Arc::new(DownEmbedder))
        .oneshot(post_json("/embed", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_body(response).await;
    assert_eq!(json["kind"], "embedding_error");
}

#[tokio::test]
async fn test_health_and_readiness() {
    let response = themed_router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = themed_router()
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router(Arc::new(DownEmbedder))
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_info_names_providers() {
    let response = themed_router()
        .oneshot(Request::get("/api/info").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["name"], "reqmap");
    assert_eq!(json["providers"]["embeddings"], "fixed");
    assert_eq!(json["providers"]["naming"], "echo");
}
