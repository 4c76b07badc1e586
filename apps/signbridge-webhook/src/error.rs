//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid JSON payload: {0}")]
    BadPayload(String),

    #[error("Delivery not found: {0}")]
    DeliveryNotFound(u64),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, "Invalid signature".to_string())
            }
            ApiError::BadPayload(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON payload: {msg}"),
            ),
            ApiError::DeliveryNotFound(seq) => (
                StatusCode::NOT_FOUND,
                format!("Delivery not found: {seq}"),
            ),
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
