/// Application Error Handling
///
/// Domain modules own their error enums (`AuthError`, `TokenError`,
/// `StoreError`); this module defines the request-validation and
/// configuration errors plus `AppError`, the single type handlers return.
/// `AppError` maps every kind to an HTTP status and a stable error code
/// and logs it with a per-response error id.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::auth::{AuthError, TokenError};

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for request input
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(&'static str),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
    #[error("{0} contains suspicious content")]
    SuspiciousContent(&'static str),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required config: {0}")]
    MissingRequired(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type returned by HTTP handlers and middleware
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("Authorization header is required")]
    MissingToken,
    #[error("Internal error: {0}")]
    Internal(String),
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response body
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Always "failed"
    pub message: &'static str,
    /// Human-readable error description
    pub error: String,
    /// Error code for client-side handling
    pub code: &'static str,
    /// Unique id correlating the response with the server log line
    pub error_id: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, error: String, code: &'static str) -> Self {
        Self {
            message: "failed",
            error,
            code,
            error_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Auth(e) => match e {
                AuthError::EmailTaken => "EMAIL_TAKEN",
                AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
                AuthError::NotFound => "NOT_FOUND",
                AuthError::InvalidRefreshToken(_) => "INVALID_REFRESH_TOKEN",
                AuthError::Internal(_) => "INTERNAL_ERROR",
            },
            AppError::Token(e) => match e {
                TokenError::Expired => "TOKEN_EXPIRED",
                TokenError::NotYetValid => "TOKEN_NOT_YET_VALID",
                TokenError::InvalidSignature => "INVALID_SIGNATURE",
                TokenError::Malformed => "MALFORMED_TOKEN",
                TokenError::InvalidClaims => "INVALID_CLAIMS",
                TokenError::WrongTokenType => "WRONG_TOKEN_TYPE",
                TokenError::Signing(_) => "INTERNAL_ERROR",
            },
            AppError::MissingToken => "MISSING_TOKEN",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to return to the caller. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Auth(AuthError::Internal(_))
            | AppError::Token(TokenError::Signing(_))
            | AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Auth(AuthError::InvalidRefreshToken(_)) => {
                "Invalid refresh token".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn log_error(&self, error_id: &str) {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error_id = error_id, code = self.code(), error = %self, "Internal error");
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                tracing::info!(error_id = error_id, code = self.code(), error = %self, "Validation error");
            }
            _ => {
                tracing::warn!(error_id = error_id, code = self.code(), error = %self, "Request rejected");
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Auth(e) => match e {
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::NotFound => StatusCode::NOT_FOUND,
                AuthError::InvalidCredentials | AuthError::InvalidRefreshToken(_) => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Token(_) | AppError::MissingToken => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        HttpResponse::build(self.status_code()).json(ErrorResponse::new(
            error_id,
            self.public_message(),
            self.code(),
        ))
    }
}
