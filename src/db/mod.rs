//! Account and audit-log persistence.
//!
//! A single libsql database holds the user store (accounts with their
//! credential material and security state) and the append-only audit log.
//! The security core treats this module as an opaque, potentially failing
//! dependency: every error surfaces as the store-unavailable kind, never as
//! an authentication failure.

pub mod store;

pub use store::{Account, PasswordHistoryEntry, SessionRecord, UserStore};
