use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message returned to callers for faults they can do nothing about.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something goes wrong.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Client errors carry their message as-is; auth and server faults get a
        // fixed message with the detail under "error".
        let body = match self {
            AppError::Auth(reason) => {
                tracing::warn!("Rejected request: {}: {}", status, reason);
                json!({
                    "status": "fail",
                    "message": "Unauthorized",
                    "error": reason
                })
            }
            AppError::Internal(detail) | AppError::Database(detail) => {
                tracing::error!("Error: {}: {}", status, detail);
                json!({
                    "status": "fail",
                    "message": INTERNAL_ERROR_MESSAGE,
                    "error": detail
                })
            }
            AppError::BadRequest(message)
            | AppError::Forbidden(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message) => {
                tracing::warn!("Rejected request: {}: {}", status, message);
                json!({
                    "status": "fail",
                    "message": message
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
