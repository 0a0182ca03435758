//! API server configuration.
//!
//! Configuration is loaded from environment variables once at startup.
//! `DATABASE_URL` and `JWT_SECRET` are required; everything else has a default.

use std::env;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite location, `sqlite://path` or a plain path
    pub database_url: String,

    /// Secret key for signing session tokens
    pub jwt_secret: String,

    /// Session and token lifetime in seconds
    pub session_lifetime_secs: i64,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Reject logins for accounts an admin has not verified. Off unless
    /// `REQUIRE_VERIFIED_LOGIN=true`.
    pub require_verified_login: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingRequired(key.to_string()))
        };

        let config = ApiConfig {
            http_port: parse_or(&lookup, "HTTP_PORT", 8080)?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            session_lifetime_secs: parse_or(&lookup, "SESSION_LIFETIME_SECS", 8 * 60 * 60)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            require_verified_login: parse_or(&lookup, "REQUIRE_VERIFIED_LOGIN", false)?,
        };

        if config.session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("SESSION_LIFETIME_SECS".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
