use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the entire application
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn auth<T: Into<String>>(msg: T) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        Self::Internal(msg.into())
    }

    /// Get error category for logging and response bodies
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Storage(_) => "storage",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
            AppError::Authentication(_) => "auth",
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::ServiceUnavailable(_) => "service_unavailable",
            AppError::Internal(_) => "internal",
        }
    }

    /// Get HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::Storage(_) => 500,
            AppError::Database(_) => 500,
            AppError::Config(_) => 500,
            AppError::Authentication(_) => 401,
            AppError::Validation(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Conflict(_) => 409,
            AppError::InvalidRequest(_) => 400,
            AppError::ServiceUnavailable(_) => 503,
            AppError::Internal(_) => 500,
        }
    }

    /// Message safe to hand back to a client.
    ///
    /// Server-side failures keep their detail in the logs only.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Storage(_) | AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            AppError::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::Authentication(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InvalidRequest(msg) => msg.clone(),
        }
    }

    /// Convert to JSON for API responses
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": self.category(),
            "message": self.public_message(),
        })
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        if self.http_status_code() >= 500 {
            tracing::error!(category = self.category(), "{}", self);
        }
        HttpResponse::build(self.status_code()).json(self.to_json())
    }
}
