//! HTTP error handling and response types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use weather_core::WeatherError;

/// Error body: `{"success": false, "message": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Upstream provider failure or rejected comparison
    BadRequest(String),
    NotFound(String),
    /// Missing or malformed input
    Unprocessable(String),
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Unprocessable(msg)
            | AppError::Internal(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!(%status, %message, "request failed");
        }

        (status, Json(ApiError::new(message))).into_response()
    }
}

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        let message = err.to_string();
        match err {
            WeatherError::Validation(_) => AppError::Unprocessable(message),
            WeatherError::Provider { .. } | WeatherError::InvalidComparison(_) => AppError::BadRequest(message),
            WeatherError::NotFound(_) => AppError::NotFound(message),
            WeatherError::Storage(_) => AppError::Internal(message),
        }
    }
}

/// Undecodable or non-JSON request bodies.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Unprocessable(rejection.body_text())
    }
}
