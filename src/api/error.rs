use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::media::MediaError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Media tool failure: {0}")]
    UpstreamTool(String),

    #[error("Media tool timed out: {0}")]
    ToolTimeout(String),

    #[error("Object storage error: {0}")]
    Storage(String),

    #[error("Record store error: {0}")]
    RecordStore(String),

    #[error("I/O error: {0}")]
    InternalIo(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamTool(_)
            | AppError::ToolTimeout(_)
            | AppError::Storage(_)
            | AppError::RecordStore(_)
            | AppError::InternalIo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MediaError> for AppError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Timeout { .. } => AppError::ToolTimeout(e.to_string()),
            MediaError::Staging(io) => AppError::InternalIo(io.to_string()),
            other => AppError::UpstreamTool(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::InternalIo(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::InvalidInput(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg) => msg,
            AppError::UpstreamTool(detail) | AppError::ToolTimeout(detail) => {
                tracing::error!("Media tool error: {}", detail);
                "Could not process video".to_string()
            }
            AppError::Storage(detail) => {
                tracing::error!("Object storage error: {}", detail);
                "Could not store video".to_string()
            }
            AppError::RecordStore(detail) => {
                tracing::error!("Record store error: {}", detail);
                "Internal Server Error".to_string()
            }
            AppError::InternalIo(detail) => {
                tracing::error!("I/O error: {}", detail);
                "Internal Server Error".to_string()
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
