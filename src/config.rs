//! Environment-driven configuration.
//!
//! Everything is read once at startup (after `.env` has been loaded) and kept
//! in the global [`CONFIG`].

use std::{env, str::FromStr};

/// Fallback signing secret; refused at startup in production.
pub const DEFAULT_JWT_SECRET: &str = "your-super-secret-key-change-in-production";

lazy_static::lazy_static! {
    pub static ref CONFIG: Config = Config::from_env();
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub database: DbConfig,
    pub jwt: JwtConfig,
    pub cors_origins: Vec<String>,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
    pub refresh_expiry_hours: i64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

impl MailConfig {
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.username.is_some() && self.password.is_some()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", 3000),
            database: DbConfig {
                url: var("DATABASE_URL"),
                max_connections: parse_or("DB_POOL_MAX", 10),
                min_connections: parse_or("DB_POOL_MIN", 2),
                idle_timeout_secs: parse_or("DB_IDLE_TIMEOUT", 300),
            },
            jwt: JwtConfig {
                secret: var("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
                expiry_hours: parse_or("JWT_EXPIRY_HOURS", 24),
                refresh_expiry_hours: parse_or("REFRESH_EXPIRY_HOURS", 168),
            },
            cors_origins: parse_origins(
                &var("CORS_ORIGINS")
                    .unwrap_or_else(|| "http://localhost:3001,http://localhost:5173".to_string()),
            ),
            mail: MailConfig {
                host: var("MAIL_HOST"),
                port: parse_or("MAIL_PORT", 587),
                username: var("MAIL_USERNAME"),
                password: var("MAIL_PASSWORD"),
                from: var("MAIL_FROM"),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Access-token lifetime in seconds, as reported to clients.
    pub fn access_token_ttl_secs(&self) -> i64 {
        self.jwt.expiry_hours * 3600
    }
}

/// Non-empty environment variable.
fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
