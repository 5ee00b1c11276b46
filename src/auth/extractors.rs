use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::middleware::GateError;

/// Caller identity placed in the request extensions by `require_auth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present if the gate ran for this route.
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(GateError::MissingCredential)
    }
}
