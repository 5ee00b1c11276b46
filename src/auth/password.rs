use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::PasswordConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    Params(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Argon2id hasher. Output is a PHC string carrying its own salt and parameters.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    // Verified against whenever there is no real hash to check, so that
    // every failed check costs one full argon2 pass.
    dummy_hash: String,
}

impl CredentialHasher {
    pub fn new(cfg: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| PasswordError::Params(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let filler = SaltString::generate(&mut OsRng);
        let dummy_hash = hash_with(&argon2, filler.as_str())?;
        Ok(Self { argon2, dummy_hash })
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, plain)
    }

    /// Never errors: a malformed stored hash is a mismatch.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                self.burn(plain);
                false
            }
        }
    }

    /// Spends one verification without a stored hash.
    pub fn burn(&self, plain: &str) {
        if let Ok(parsed) = PasswordHash::new(&self.dummy_hash) {
            let _ = self.argon2.verify_password(plain.as_bytes(), &parsed);
        }
    }
}

fn hash_with(argon2: &Argon2<'_>, plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hash(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(&PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .expect("cheap argon2 params are valid")
}
