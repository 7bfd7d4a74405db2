use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every failure renders as `{"success": false, "message": ...}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Optimization produced invalid result")]
    InvalidOptimizationResult,

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::Validation(format!("Invalid multipart upload: {}", e.body_text()))
        }
    }
}

impl AppError {
    /// Status code and client-facing message. Server-side failures get a
    /// generic message; the detail only goes to the log.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AppError::InvalidOptimizationResult => {
                tracing::error!("Prompt optimization produced an unusable result");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Optimization produced invalid result".to_string(),
                )
            }
            AppError::Llm(e) => llm_status_and_message(e),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

fn llm_status_and_message(e: &LlmError) -> (StatusCode, String) {
    match e {
        LlmError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        LlmError::RateLimited { message } => {
            tracing::warn!("LLM rate limited: {message}");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "API rate limit exceeded. Please wait a moment and try again.".to_string(),
            )
        }
        LlmError::QuotaExceeded { message } => {
            tracing::warn!("LLM quota exceeded: {message}");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "API quota exceeded. Please try again later or contact support.".to_string(),
            )
        }
        LlmError::Timeout => {
            tracing::error!("LLM error: {e}");
            (
                StatusCode::GATEWAY_TIMEOUT,
                "The AI provider took too long to respond".to_string(),
            )
        }
        LlmError::MalformedResponse(_) | LlmError::Api { .. } | LlmError::Http(_) => {
            tracing::error!("LLM error: {e}");
            (
                StatusCode::BAD_GATEWAY,
                "An AI processing error occurred".to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let body = Json(json!({
            "success": false,
            "message": message
        }));

        (status, body).into_response()
    }
}
