use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, PublicUser},
    jwt::{JwtKeys, TokenError},
    password::{CredentialHasher, PasswordError},
    repo::UserStore,
    repo_types::{StoreError, User},
};

/// Failure kinds of the auth flows. Transport-agnostic; see `ApiError` for
/// the HTTP mapping.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already exists")]
    EmailTaken,
    /// Unknown email and wrong password both land here.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    /// Lost the race against a concurrent registration of the same email.
    #[error("email already exists")]
    DuplicateEmail,
    #[error("storage failure")]
    Storage(#[source] sqlx::Error),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::Storage(e) => AuthError::Storage(e),
        }
    }
}

/// Register/login/identify over a `UserStore`. Holds no mutable state.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, hasher: CredentialHasher, keys: JwtKeys) -> Self {
        Self {
            store,
            hasher,
            keys,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        if self.store.email_exists(email).await? {
            warn!(email = %email, "email already registered");
            return Err(AuthError::EmailTaken);
        }

        let hash = self.hasher.hash(password)?;
        let user = User::new(first_name, last_name, email, hash);
        // A concurrent insert can still win here; the store's unique index decides.
        self.store.create(&user).await?;

        let token = self.keys.sign(user.id, &user.email)?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(AuthResponse {
            token,
            user: user.into(),
            message: "Registration successful".into(),
        })
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let user = match self.store.find_by_email(email).await? {
            Some(u) => u,
            None => {
                self.hasher.burn(password);
                warn!(email = %email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.keys.sign(user.id, &user.email)?;
        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok(AuthResponse {
            token,
            user: user.into(),
            message: "Login successful".into(),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, id: Uuid) -> Result<PublicUser, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .map(PublicUser::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// Verifies the token and confirms its subject still has an active account.
    #[instrument(skip(self, token))]
    pub async fn validate_token(&self, token: &str) -> Result<PublicUser, AuthError> {
        let claims = self.keys.verify(token)?;
        match self.store.find_by_id(claims.sub).await? {
            Some(user) => Ok(user.into()),
            None => {
                warn!(user_id = %claims.sub, "valid token for missing user");
                Err(AuthError::UserNotFound)
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_service(store: Arc<dyn UserStore>) -> AuthService {
    AuthService::new(
        store,
        super::password::test_hasher(),
        JwtKeys::new(
            "engine-secret",
            "test-issuer",
            "test-aud",
            std::time::Duration::from_secs(600),
        ),
    )
}
