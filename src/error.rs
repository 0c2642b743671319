// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::{IdError, LoginIdError, SessionError, StatsError};
use crate::services::{PasswordError, TokenError};

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Invalid login id or password")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::NonMonotonicLoginDate { .. } => AppError::Conflict(err.to_string()),
            StatsError::InvalidStatistics(_) => AppError::Internal(err.into()),
        }
    }
}

impl From<IdError> for AppError {
    fn from(err: IdError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<LoginIdError> for AppError {
    fn from(err: LoginIdError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch => AppError::InvalidCredentials,
            PasswordError::Hashing(_) | PasswordError::InvalidHash => {
                AppError::Internal(err.into())
            }
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Stable machine-readable code for each token failure.
fn token_error_code(err: &TokenError) -> &'static str {
    match err {
        TokenError::BadSignature => "bad_signature",
        TokenError::WrongIssuer => "wrong_issuer",
        TokenError::WrongAudience => "wrong_audience",
        TokenError::Expired => "token_expired",
        TokenError::Malformed => "malformed_token",
    }
}

fn detail(msg: &str) -> Option<serde_json::Value> {
    Some(serde_json::Value::String(msg.to_string()))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken(err) => {
                (StatusCode::UNAUTHORIZED, token_error_code(err), None)
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", None)
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", detail(msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", detail(msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", detail(msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", detail(msg)),
            // Field-level messages, keyed by field name
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                serde_json::to_value(errors).ok(),
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionId;

    #[test]
    fn test_token_errors_are_unauthorized() {
        for err in [
            TokenError::BadSignature,
            TokenError::WrongIssuer,
            TokenError::WrongAudience,
            TokenError::Expired,
            TokenError::Malformed,
        ] {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_domain_errors_map_to_status() {
        let completed = AppError::from(SessionError::AlreadyCompleted(SessionId::generate()));
        assert_eq!(completed.into_response().status(), StatusCode::CONFLICT);

        let mismatch = AppError::from(PasswordError::Mismatch);
        assert!(matches!(mismatch, AppError::InvalidCredentials));

        let bad_hash = AppError::from(PasswordError::InvalidHash);
        assert_eq!(
            bad_hash.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let bad_login = AppError::from(LoginIdError::TooShort);
        assert_eq!(bad_login.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_errors_are_bad_request() {
        use validator::Validate;

        #[derive(Validate)]
        struct Sample {
            #[validate(length(min = 1))]
            content: String,
        }

        let errors = Sample {
            content: String::new(),
        }
        .validate()
        .unwrap_err();
        let response = AppError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
