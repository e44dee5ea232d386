//! Account-security core.
//!
//! Everything that has to be right for authentication to be safe lives here:
//! credential hashing, stateless session tokens, login throttling with
//! lockout, password-history reuse prevention, reset-token lifecycle, the
//! request rate limiter, and the middleware that dispatches between
//! authentication strategies.
//!
//! # Module Structure
//!
//! - [`hasher`] - Argon2id credential hashing with constant-time verification
//! - [`token`] - HS256 signed session tokens (sign/verify)
//! - [`throttle`] - failed-attempt counting and time-boxed account lockout
//! - [`history`] - password-reuse prevention over a bounded history
//! - [`reset`] - single-use, time-limited password-reset tokens
//! - [`rate_limit`] - fixed-window per-key request limiter
//! - [`middleware`] - auth dispatcher, maintenance and rate-limit layers
//!
//! # Security Properties
//!
//! - **Hashing**: memory-hard KDF with a per-account random salt; digest
//!   comparison is constant time.
//! - **Tokens**: self-contained HS256 JWTs; the server keeps no session
//!   table, and invalid/expired/forged all produce one generic error.
//! - **Lockout**: five failures lock an account for fifteen minutes by
//!   default; a locked account answers exactly like a wrong password.
//! - **Concurrency**: hashing and signing are pure; per-account state is
//!   last-write-wins through the store; the limiter uses per-key sharded
//!   locking rather than one global lock.
//!
//! All components take their secrets, limits, and durations as explicit
//! constructor configuration - nothing reads ambient process state.

/// Argon2id credential hashing and verification.
pub mod hasher;
/// Password-reuse prevention over bounded history.
pub mod history;
/// Auth dispatcher middleware, extractors, maintenance and rate-limit layers.
pub mod middleware;
/// Fixed-window request rate limiting.
pub mod rate_limit;
/// Password-reset token lifecycle.
pub mod reset;
/// Failed-login throttling and account lockout.
pub mod throttle;
/// Signed session token codec.
pub mod token;

pub use hasher::{random_token, CredentialHasher};
pub use history::PasswordHistory;
pub use middleware::{AuthIdentity, ClientIp, CurrentUser};
pub use rate_limit::RateLimiter;
pub use reset::ResetTokens;
pub use throttle::LoginThrottle;
pub use token::TokenCodec;
