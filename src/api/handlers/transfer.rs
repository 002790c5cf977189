use axum::body::Body;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use crate::api::server::ApiState;
use crate::api::types::{CreateTransferRequest, StatusQuery};
use crate::session::{FileDescriptor, SessionId};
use crate::utils::error::{RelayError, Result};

fn parse_session_id(raw: &str) -> Result<SessionId> {
    raw.parse::<SessionId>()
        .map_err(|_| RelayError::BadRequest(format!("invalid transfer id '{raw}'")))
}

/// POST /api/create
pub async fn create_transfer(
    State(state): State<ApiState>,
    Json(request): Json<CreateTransferRequest>,
) -> Result<impl IntoResponse> {
    if request.size <= 0 {
        return Err(RelayError::BadRequest("size must be positive".to_string()));
    }

    let file = FileDescriptor::new(request.name, request.size as u64, request.mime_type);
    let id = state.registry.create(file);
    info!(session_id = id, "transfer created");

    Ok(id.to_string())
}

/// GET /api/status?id=N — upgrades to a WebSocket carrying status events.
pub async fn transfer_status(
    State(state): State<ApiState>,
    Query(query): Query<StatusQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    let id = parse_session_id(&query.id)?;
    let session = state.registry.get(id).ok_or(RelayError::NotFound)?;
    session.status_response(ws)
}

/// POST /u/{id} — streams the uploader's body into the copy loop.
pub async fn start_upload(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Result<&'static str> {
    let id = parse_session_id(&id)?;
    let session = state.registry.get(id).ok_or(RelayError::NotFound)?;
    session.upload_response(request).await
}

/// GET /d/{id} — returns the streaming download response.
pub async fn start_download(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_session_id(&id)?;
    let session = state.registry.get(id).ok_or(RelayError::NotFound)?;
    session.download_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_session_id_rejects_non_numeric() {
        assert!(parse_session_id("abc").is_err());
    }

    #[test]
    fn parse_session_id_accepts_numeric() {
        assert_eq!(parse_session_id("42").unwrap(), 42);
    }
}
