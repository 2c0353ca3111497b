//! HTTP surface over a shared [`RagService`]

pub mod error;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use sage_core::service::DEFAULT_MAX_CHUNKS;
use sage_core::{QueryResponse, RagService};

use self::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
}

fn default_max_chunks() -> usize {
    DEFAULT_MAX_CHUNKS
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub documents_loaded: bool,
    pub chunks: usize,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
    pub chunks: usize,
}

/// Build the application router
pub fn router(service: Arc<RagService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/query", post(query))
        .route("/reload", post(reload))
        .with_state(service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Sage RAG service with employee lookups",
        "version": sage_core::VERSION,
        "endpoints": {
            "query": "POST /query",
            "health": "GET /health",
            "reload": "POST /reload",
        }
    }))
}

async fn health(State(service): State<Arc<RagService>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        documents_loaded: service.is_loaded().await,
        chunks: service.chunk_count().await,
    })
}

async fn query(
    State(service): State<Arc<RagService>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }

    let response = service.query(&request.query, request.max_chunks).await?;
    info!(
        tool_calls_used = response.tool_calls_used,
        chunks = response.relevant_chunks.len(),
        "answered query"
    );
    Ok(Json(response))
}

async fn reload(State(service): State<Arc<RagService>>) -> Result<Json<ReloadResponse>, ApiError> {
    let chunks = service
        .reload()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to reload knowledge base: {}", e)))?;
    Ok(Json(ReloadResponse {
        status: "reloaded",
        chunks,
    }))
}
