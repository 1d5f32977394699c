use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error taxonomy. Validation failures are resolved
/// client-side (field feedback), everything else maps to an HTTP status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing required fields: {0:?}")]
    MissingFields(Vec<&'static str>),
    #[error("{0}")]
    Validation(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("not allowed")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("expense is no longer pending")]
    AlreadyDecided,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::MissingFields(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "validation", "missing": fields }),
            ),
            AppError::Validation(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "validation", "message": message }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "unauthorized" }),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "forbidden" })),
            AppError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "not_found" })),
            AppError::AlreadyDecided => (
                StatusCode::CONFLICT,
                json!({ "error": "conflict", "message": "expense is no longer pending" }),
            ),
            AppError::Database(e) => {
                log::error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal" }),
                )
            }
            AppError::Storage(e) => {
                log::error!("storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal" }),
                )
            }
            AppError::Token(e) => {
                log::error!("token error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
