//! Request and response data transfer objects for the HTTP API.

use serde::{Deserialize, Serialize};

/// Request body for `POST /insert`.
#[derive(Debug, Deserialize)]
pub struct InsertRequest {
    pub id: String,
    pub vector: Vec<f32>,
}

/// Response body for `POST /insert`. Failures ride in the body, not the
/// transport status: `success` is false and `error` carries the message.
#[derive(Debug, Serialize)]
pub struct InsertResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InsertResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Request body for `POST /search`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub vector: Vec<f32>,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    10
}

/// One search hit: external id and cosine similarity in [-1, 1].
#[derive(Debug, Serialize)]
pub struct MatchDto {
    pub id: String,
    pub score: f32,
}

/// Response body for `POST /search`.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub matches: Vec<MatchDto>,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub vectors: usize,
    pub wal_size_bytes: u64,
    pub uptime_secs: u64,
}
