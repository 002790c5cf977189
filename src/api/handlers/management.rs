use axum::{extract::State, http::StatusCode, Json};

use crate::api::server::ApiState;
use crate::api::types::HealthResponse;

/// GET /health - liveness probe.
pub async fn health_check(State(_state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response))
}
