//! Handler error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use intake::{DatabaseError, EmailError, ExportError};
use serde_json::json;
use thiserror::Error;

/// Every handler failure is reported as
/// `{"status": "error", "message": ...}` with a 500 status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::error!("Request failed: {}", self);
        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
