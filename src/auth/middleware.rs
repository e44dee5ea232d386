use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{header, request::Parts, Extensions, HeaderMap},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::auth::rate_limit::RateLimiter;
use crate::types::{AppError, Result, Role};
use crate::AppState;

/// Identity resolved by the auth dispatcher and attached to the request.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub id: String,
    pub role: Role,
    pub via_api_key: bool,
}

impl AuthIdentity {
    /// Gate for the admin surface.
    pub fn require_admin(&self) -> Result<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// Auth dispatcher: resolves a caller identity or rejects the request.
///
/// A long-lived `x-api-key` credential is checked first and resolves
/// directly to an account. Otherwise a `Bearer` token is required - absence
/// is an error, not anonymous access. Deleted or missing subjects are
/// rejected even when the token itself is structurally valid, and every
/// rejection uses the same generic token error.
pub async fn auth_middleware(state: AppState, mut req: Request, next: Next) -> Result<Response> {
    if let Some(api_key) = req
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok())
    {
        let account = state
            .store
            .get_by_api_key(api_key)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or(AppError::TokenInvalid)?;

        // Constant-time recheck against the stored value
        let stored = account.api_key.as_deref().unwrap_or_default();
        if !bool::from(stored.as_bytes().ct_eq(api_key.as_bytes())) {
            return Err(AppError::TokenInvalid);
        }

        req.extensions_mut().insert(AuthIdentity {
            id: account.id,
            role: account.role,
            via_api_key: true,
        });
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::TokenInvalid)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::TokenInvalid)?;

    let claims = state.tokens.verify(token)?;

    let account = state
        .store
        .get_by_id(&claims.sub)
        .await?
        .filter(|a| !a.is_deleted)
        .ok_or(AppError::TokenInvalid)?;

    req.extensions_mut().insert(AuthIdentity {
        id: account.id,
        role: account.role,
        via_api_key: false,
    });

    Ok(next.run(req).await)
}

/// Blocks everything except the admin surface while maintenance mode is on.
pub async fn maintenance_middleware(state: AppState, req: Request, next: Next) -> Result<Response> {
    if state.config.server.maintenance && !req.uri().path().starts_with("/api/admin") {
        return Err(AppError::Maintenance);
    }
    Ok(next.run(req).await)
}

/// Per-route rate limiting, keyed by bucket name plus caller origin.
pub async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    bucket: &'static str,
    limit: u32,
    window: Duration,
    req: Request,
    next: Next,
) -> Result<Response> {
    let caller = caller_origin(req.headers(), req.extensions())
        .unwrap_or_else(|| "unknown".to_string());

    if !limiter.allow(bucket, &caller, limit, window) {
        tracing::debug!(bucket, %caller, "rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(req).await)
}

fn caller_origin(headers: &HeaderMap, extensions: &Extensions) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string())
        })
}

// Extractor for the resolved identity

/// Extracts the [`AuthIdentity`] placed in extensions by [`auth_middleware`].
pub struct CurrentUser(pub AuthIdentity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthIdentity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::TokenInvalid)
    }
}

/// Best-effort caller address for audit entries. Never rejects.
pub struct ClientIp(pub Option<String>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(ClientIp(caller_origin(&parts.headers, &parts.extensions)))
    }
}
