//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Admin surface (listing, soft delete, purge sweep).
pub mod admin;
/// Authentication handlers (register, verify, login, reset, profile).
pub mod auth;
/// Liveness probe.
pub mod health;

use crate::AppState;

/// Append an audit entry without blocking or failing the caller.
///
/// Recording happens on a detached task; a store failure is logged and
/// otherwise ignored so the primary operation never fails on its account.
pub(crate) fn audit(
    state: &AppState,
    user_id: Option<String>,
    action: &'static str,
    meta: serde_json::Value,
    ip: Option<String>,
) {
    let store = state.store.clone();
    tokio::spawn(async move {
        if let Err(err) = store
            .record_audit(user_id.as_deref(), action, &meta, ip.as_deref())
            .await
        {
            tracing::warn!(error = %err, action, "failed to record audit entry");
        }
    });
}
