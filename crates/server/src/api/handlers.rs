//! HTTP request handlers and shared application state.

use crate::api::errors::ApiError;
use crate::api::metrics;
use crate::api::models::{
    HealthResponse, InsertRequest, InsertResponse, MatchDto, SearchRequest, SearchResponse,
};
use axum::extract::State;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use nimbusdb_core::config;
use nimbusdb_core::hnsw::HnswIndex;
use nimbusdb_core::storage::WriteAheadLog;
use std::sync::Arc;
use std::time::Instant;

/// Shared state passed to every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<HnswIndex>,
    pub wal: Arc<WriteAheadLog>,
    pub prometheus_handle: PrometheusHandle,
    pub start_time: Instant,
}

fn validate_components(vector: &[f32]) -> Option<&'static str> {
    if vector.is_empty() {
        return Some("empty vector");
    }
    if vector.iter().any(|c| !c.is_finite()) {
        return Some("vector contains NaN or Inf");
    }
    None
}

/// `POST /insert`
///
/// The record is made durable before the index sees it. A WAL failure
/// leaves the index untouched; an index failure (duplicate id, zero
/// magnitude) leaves a WAL record that replay will refuse the same way.
pub async fn insert(
    State(state): State<AppState>,
    Json(req): Json<InsertRequest>,
) -> Json<InsertResponse> {
    if let Some(reason) = validate_components(&req.vector) {
        metrics::record_insert("rejected");
        return Json(InsertResponse::failure(reason));
    }

    if let Err(e) = state.wal.append_insert(&req.id, &req.vector) {
        tracing::error!(id = %req.id, error = %e, "WAL append failed");
        metrics::record_insert("wal_error");
        return Json(InsertResponse::failure("persistence failed"));
    }

    match state.index.insert(&req.id, &req.vector) {
        Ok(()) => {
            metrics::record_insert("ok");
            Json(InsertResponse::ok())
        }
        Err(e) => {
            metrics::record_insert("rejected");
            Json(InsertResponse::failure(e.to_string()))
        }
    }
}

/// `POST /search`
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if req.k == 0 {
        return Err(ApiError::BadRequest("k must be at least 1".into()));
    }
    if req.k > config::MAX_K {
        return Err(ApiError::BadRequest(format!(
            "k exceeds maximum of {}",
            config::MAX_K
        )));
    }
    if let Some(reason) = validate_components(&req.vector) {
        return Err(ApiError::BadRequest(reason.into()));
    }

    metrics::record_search();
    let matches = state
        .index
        .search(&req.vector, req.k)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(SearchResponse {
        matches: matches
            .into_iter()
            .map(|m| MatchDto {
                id: m.id,
                score: m.score,
            })
            .collect(),
    }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let wal_size_bytes = std::fs::metadata(state.wal.path())
        .map(|m| m.len())
        .unwrap_or(0);
    Json(HealthResponse {
        status: "ok",
        vectors: state.index.len(),
        wal_size_bytes,
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// `GET /metrics`
pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    state.prometheus_handle.render()
}
