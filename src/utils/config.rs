use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// When set, answer 503 everywhere except the admin surface.
    pub maintenance: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Process-wide signing secret. Tokens issued under one secret are
    /// unverifiable after a restart with a different one.
    pub secret: String,
    pub token_expiry_secs: i64,
    pub max_login_attempts: u32,
    pub lock_duration_secs: i64,
    pub password_history_limit: usize,
    pub reset_token_expiry_secs: i64,
    /// Days a soft-deleted account is retained before the purge sweep may
    /// remove it.
    pub retention_days: i64,
}

/// Per-bucket request ceilings, all counted over the same window.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub register: u32,
    pub verify: u32,
    pub login: u32,
    pub reset_request: u32,
    pub reset: u32,
    pub profile: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
                maintenance: env::var("MAINTENANCE")
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
            },
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH").unwrap_or_else(|_| "custos.db".to_string()),
            },
            auth: AuthConfig {
                secret: env::var("AUTH_SECRET")?,
                token_expiry_secs: env::var("TOKEN_EXPIRY_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()?,
                max_login_attempts: env::var("MAX_LOGIN_ATTEMPTS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                lock_duration_secs: env::var("LOCK_DURATION_SECS")
                    .unwrap_or_else(|_| "900".to_string())
                    .parse()?,
                password_history_limit: env::var("PASSWORD_HISTORY_LIMIT")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()?,
                reset_token_expiry_secs: env::var("RESET_TOKEN_EXPIRY_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()?,
                retention_days: env::var("RETENTION_DAYS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            },
            rate_limit: RateLimitConfig {
                window_secs: env::var("RATE_LIMIT_WINDOW_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
                register: env::var("RATE_LIMIT_REGISTER")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()?,
                verify: env::var("RATE_LIMIT_VERIFY")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()?,
                login: env::var("RATE_LIMIT_LOGIN")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                reset_request: env::var("RATE_LIMIT_RESET_REQUEST")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                reset: env::var("RATE_LIMIT_RESET")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                profile: env::var("RATE_LIMIT_PROFILE")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            },
        })
    }
}
