use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use super::{extractors::AuthUser, jwt::JwtKeys};

/// Why the gate turned a request away. All of them are 401 to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    MissingCredential,
    MalformedCredential,
    InvalidCredential,
}

impl GateError {
    pub fn message(self) -> &'static str {
        match self {
            GateError::MissingCredential => "Authorization header required",
            GateError::MalformedCredential => {
                "Invalid authorization format. Expected: Bearer <token>"
            }
            GateError::InvalidCredential => "Invalid or expired token",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": self.message() })),
        )
            .into_response()
    }
}

/// Splits `Bearer <token>`; anything else in the header is malformed.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if scheme != "Bearer" || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// Rejects requests without a valid bearer token, and otherwise attaches the
/// caller's identity to the request extensions as `AuthUser`.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(GateError::MissingCredential)?;
    let header = header.to_str().map_err(|_| GateError::MalformedCredential)?;
    if header.trim().is_empty() {
        return Err(GateError::MissingCredential);
    }
    let token = bearer_token(header).ok_or(GateError::MalformedCredential)?;

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "rejecting request");
        GateError::InvalidCredential
    })?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        email: claims.email,
    });
    Ok(next.run(req).await)
}
