use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("File too large: upload exceeds limit of {limit}MB")]
    FileTooLarge { limit: usize },

    #[error("Invalid upload: {message}")]
    InvalidFile { message: String },

    #[error("Unsupported file type '{extension}': expected jpg, jpeg or png")]
    UnsupportedFileType { extension: String },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    #[error("Invalid quality level '{quality}': expected one of 75, 50, 25")]
    InvalidQuality { quality: String },

    #[error("Rate limit exceeded: maximum concurrent requests reached")]
    RateLimitExceeded,

    #[error("Staging failed: {message}")]
    StagingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::InvalidFile { .. } => "INVALID_FILE",
            AppError::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            AppError::MissingFile => "MISSING_FILE",
            AppError::SessionNotFound { .. } => "SESSION_NOT_FOUND",
            AppError::InvalidQuality { .. } => "INVALID_QUALITY",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::StagingError { .. } => "STAGING_ERROR",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::ConfigError { .. } => "CONFIG_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidFile { .. } => StatusCode::BAD_REQUEST,
            AppError::UnsupportedFileType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidQuality { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::StagingError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::ConfigError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();
        let request_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        // Only server faults are logged at error level
        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %message,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
                "request_id": request_id,
                "timestamp": timestamp
            },
            "data": null
        }));

        (status, body).into_response()
    }
}

// Helper methods for creating specific errors
impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::ConfigError {
            message: message.into(),
        }
    }

    pub fn staging(message: impl Into<String>) -> Self {
        AppError::StagingError {
            message: message.into(),
        }
    }

    pub fn session_not_found(id: impl ToString) -> Self {
        AppError::SessionNotFound { id: id.to_string() }
    }
}
