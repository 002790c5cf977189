use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("transfer not found")]
    NotFound,

    #[error("channel closed")]
    ChannelClosed,

    #[error("channel empty")]
    ChannelEmpty,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("copy failed: {0}")]
    CopyFailure(String),

    #[error("status consumer fell behind")]
    SlowStatus,
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::ChannelClosed
            | RelayError::ChannelEmpty
            | RelayError::Io(_)
            | RelayError::Config(_)
            | RelayError::CopyFailure(_)
            | RelayError::SlowStatus => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
