use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: u64,
}

/// Argon2 cost parameters. Higher values make every hash slower.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: Option<String>,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                or("DB_USER", "postgres"),
                or("DB_PASSWORD", "postgres"),
                or("DB_HOST", "localhost"),
                or("DB_PORT", "5432"),
                or("DB_NAME", "beachboys_concert"),
            ),
        };

        let jwt = JwtConfig {
            secret: var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: or("JWT_ISSUER", "concert-auth"),
            audience: or("JWT_AUDIENCE", "concert-auth-users"),
            ttl_minutes: parse_or(var("JWT_TTL_MINUTES"), 60 * 24),
        };

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_or(var("ARGON2_MEMORY_KIB"), defaults.memory_kib),
            iterations: parse_or(var("ARGON2_ITERATIONS"), defaults.iterations),
            parallelism: parse_or(var("ARGON2_PARALLELISM"), defaults.parallelism),
        };

        Ok(Self {
            database_url,
            host: or("APP_HOST", "0.0.0.0"),
            port: parse_or(var("APP_PORT"), 8080),
            frontend_url: var("FRONTEND_URL"),
            jwt,
            password,
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
