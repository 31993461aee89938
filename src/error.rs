use std::sync::PoisonError;

use axum::response::{IntoResponse, Response};
use axum::{http::StatusCode, Json};
use tracing::error;

use crate::models::{ErrorResponse, FieldErrors};

pub const INVALID_JSON: &str = "Invalid JSON payload.";
pub const INVALID_ID: &str = "Invalid todo id.";
pub const NOT_FOUND: &str = "Todo not found.";
pub const INTERNAL: &str = "Internal server error.";

#[derive(Debug)]
pub enum AppError {
    Database(String),
    NotFound,
    /// Form-level failure such as a malformed body or id.
    BadRequest(&'static str),
    Validation(FieldErrors),
}

impl AppError {
    fn form(message: &str) -> FieldErrors {
        FieldErrors::from([("form".to_string(), message.to_string())])
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            AppError::Database(msg) => {
                error!(error = %msg, "Database failure");
                (StatusCode::INTERNAL_SERVER_ERROR, AppError::form(INTERNAL))
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, AppError::form(NOT_FOUND)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, AppError::form(msg)),
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, errors),
        };

        (status, Json(ErrorResponse { errors })).into_response()
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<time::error::Format> for AppError {
    fn from(err: time::error::Format) -> Self {
        AppError::Database(err.to_string())
    }
}

impl<T> From<PoisonError<T>> for AppError {
    fn from(err: PoisonError<T>) -> Self {
        AppError::Database(err.to_string())
    }
}
