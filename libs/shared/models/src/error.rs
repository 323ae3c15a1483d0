use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Invalid fields: {}", .0.len())]
    InvalidFields(Vec<(String, String)>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::InvalidFields(fields) => {
                let fields: Map<String, Value> = fields
                    .iter()
                    .map(|(field, message)| (field.clone(), Value::String(message.clone())))
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Some fields are invalid", "fields": fields }),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": msg, "retryable": true }),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, self);
        } else {
            tracing::debug!("Rejected request: {}: {}", status, self);
        }

        (status, Json(body)).into_response()
    }
}
