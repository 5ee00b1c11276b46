use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::User;

pub const REGISTER_MIN_PASSWORD: usize = 8;
pub const LOGIN_MIN_PASSWORD: usize = 6;
/// Column widths of `users.first_name`/`last_name` and `users.email`.
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
    pub message: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_max(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{field} must be at most {max} characters"));
    }
    Ok(())
}

fn check_password(password: &str, min: usize) -> Result<(), String> {
    if password.chars().count() < min {
        return Err(format!("password must be at least {min} characters"));
    }
    Ok(())
}

impl RegisterRequest {
    /// Normalizes the email in place and rejects malformed input.
    pub fn validate(&mut self) -> Result<(), String> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = normalize_email(&self.email);

        if self.first_name.is_empty() {
            return Err("firstName is required".into());
        }
        if self.last_name.is_empty() {
            return Err("lastName is required".into());
        }
        check_max("firstName", &self.first_name, MAX_NAME_LEN)?;
        check_max("lastName", &self.last_name, MAX_NAME_LEN)?;
        check_max("email", &self.email, MAX_EMAIL_LEN)?;
        if !is_valid_email(&self.email) {
            return Err("invalid email".into());
        }
        check_password(&self.password, REGISTER_MIN_PASSWORD)
    }
}

impl LoginRequest {
    pub fn validate(&mut self) -> Result<(), String> {
        self.email = normalize_email(&self.email);
        if !is_valid_email(&self.email) {
            return Err("invalid email".into());
        }
        check_password(&self.password, LOGIN_MIN_PASSWORD)
    }
}
