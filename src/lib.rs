//! Account registration, login and bearer-token identification over Postgres.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
