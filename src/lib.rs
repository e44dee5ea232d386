//! # Custos - Account Security Server
//!
//! A user-management backend centered on account security: credential
//! hashing, stateless signed session tokens, login throttling with lockout,
//! password-reuse prevention, reset-token lifecycle and per-endpoint rate
//! limiting.
//!
//! ## Overview
//!
//! Custos can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `custos-server` binary
//! 2. **As a library** - Import the security components into your own project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use custos::auth::{CredentialHasher, TokenCodec};
//! use custos::types::Role;
//!
//! let hasher = CredentialHasher::default();
//! let salt = hasher.generate_salt();
//! let hash = hasher.hash("hunter2hunter2", &salt)?;
//! assert!(hasher.verify("hunter2hunter2", &salt, &hash));
//!
//! let codec = TokenCodec::new("secret", 3600);
//! let token = codec.sign("user-id", Role::Member)?;
//! let claims = codec.verify(&token)?;
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Hashing, tokens, throttling, reset flow, rate limiting
//! - [`db`] - Account store and audit log (libSQL)
//! - [`types`] - Common types and error handling
//! - [`utils`] - Environment-based configuration
//!
//! ## Security Properties
//!
//! - Passwords are hashed with Argon2id under a per-account random salt.
//! - Session tokens are HS256-signed and verified with zero leeway, so an
//!   expired token is rejected at the deadline.
//! - Login failures, lockouts and resets never reveal whether an email is
//!   registered or an account is locked.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Credential hashing, session tokens, throttling and rate limiting.
pub mod auth;
/// Account store and audit log.
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use auth::{
    CredentialHasher, LoginThrottle, PasswordHistory, RateLimiter, ResetTokens, TokenCodec,
};
pub use db::UserStore;
pub use types::{AppError, Result};
pub use utils::Config;

use chrono::Duration;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Process configuration, loaded once at startup
    pub config: Arc<Config>,
    /// Account and audit-log store
    pub store: Arc<UserStore>,
    /// Argon2id credential hasher
    pub hasher: CredentialHasher,
    /// Session-token signer/verifier
    pub tokens: Arc<TokenCodec>,
    /// Failed-login counter and lockout policy
    pub throttle: LoginThrottle,
    /// Password-reuse guard
    pub history: PasswordHistory,
    /// Reset-token issue/consume policy
    pub reset: ResetTokens,
    /// Shared fixed-window rate limiter
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build the shared state from configuration and an opened store.
    pub fn new(config: Config, store: UserStore) -> Self {
        let tokens = TokenCodec::new(&config.auth.secret, config.auth.token_expiry_secs);
        let throttle = LoginThrottle::new(
            config.auth.max_login_attempts,
            Duration::seconds(config.auth.lock_duration_secs),
        );
        let history = PasswordHistory::new(config.auth.password_history_limit);
        let reset = ResetTokens::new(Duration::seconds(config.auth.reset_token_expiry_secs));

        AppState {
            config: Arc::new(config),
            store: Arc::new(store),
            hasher: CredentialHasher::default(),
            tokens: Arc::new(tokens),
            throttle,
            history,
            reset,
            limiter: Arc::new(RateLimiter::new()),
        }
    }
}
