use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Database(sqlx::Error),
    Token(jsonwebtoken::errors::Error),
    PasswordHash(argon2::password_hash::Error),
    Task(tokio::task::JoinError),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
}

impl AppError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        AppError::BadRequest(detail.into())
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        AppError::Unauthorized(detail.into())
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        AppError::Forbidden(detail.into())
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        AppError::NotFound(detail.into())
    }
}

fn detail(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(msg) => detail(StatusCode::BAD_REQUEST, &msg),
            AppError::Unauthorized(msg) => detail(StatusCode::UNAUTHORIZED, &msg),
            AppError::Forbidden(msg) => detail(StatusCode::FORBIDDEN, &msg),
            AppError::NotFound(msg) => detail(StatusCode::NOT_FOUND, &msg),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Token(e) => {
                tracing::error!("Token error: {e}");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::PasswordHash(e) => {
                tracing::error!("Password hash error: {e}");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Task(e) => {
                tracing::error!("Blocking task failed: {e}");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Token(e)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Task(e)
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(e)
    }
}
