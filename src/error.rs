// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ErrorResponse;

/// Request-level failures reported back to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to process request: {0}")]
    MalformedRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Failures of the call to the model provider. All of them send the
/// responder down the rule-based path.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("model API returned status {0}")]
    Status(u16),

    #[error("model API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API response was not valid JSON: {0}")]
    Decode(String),
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
