use serde::{Deserialize, Serialize};

/// `POST /api/create` request body.
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    #[serde(default)]
    pub name: String,
    pub size: i64,
    #[serde(default, rename = "type")]
    pub mime_type: String,
}

/// `GET /api/status` query parameters.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub id: String,
}

/// `GET /health` response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
