//! HTTP-facing errors with a `{"error": "..."}` body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::{jwt::TokenError, services::AuthError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// The message is shown to the caller; details belong in the logs.
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = %status, error = %self, "request failed");
        } else {
            warn!(status = %status, error = %self, "request rejected");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::EmailTaken | AuthError::DuplicateEmail => Self::Conflict(e.to_string()),
            AuthError::InvalidCredentials => Self::Unauthorized(e.to_string()),
            AuthError::UserNotFound => Self::NotFound(e.to_string()),
            AuthError::Token(TokenError::Signing(ref inner)) => {
                error!(error = %inner, "token signing failed");
                Self::Internal("internal server error".into())
            }
            AuthError::Token(TokenError::TtlOutOfRange(ttl)) => {
                error!(ttl_secs = ttl.as_secs(), "token lifetime out of range");
                Self::Internal("internal server error".into())
            }
            AuthError::Token(_) => Self::Unauthorized("Invalid or expired token".into()),
            AuthError::Storage(ref inner) => {
                error!(error = %inner, "storage failure");
                Self::Internal("internal server error".into())
            }
            AuthError::Password(ref inner) => {
                error!(error = %inner, "password hashing failed");
                Self::Internal("internal server error".into())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
