use crate::AppState;
use crate::auth::middleware::{auth_middleware, maintenance_middleware, rate_limit_middleware};
use crate::auth::rate_limit::RateLimiter;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;

pub fn create_router(state: AppState) -> Router {
    let window = Duration::from_secs(state.config.rate_limit.window_secs);
    let limits = &state.config.rate_limit;

    // Each public route gets its own bucket so bursts against one endpoint
    // never starve another.
    let public_routes = Router::new()
        .merge(throttled_route(
            "/api/auth/register",
            post(crate::api::handlers::auth::register),
            state.limiter.clone(),
            "register",
            limits.register,
            window,
        ))
        .merge(throttled_route(
            "/api/auth/verify-email",
            post(crate::api::handlers::auth::verify_email),
            state.limiter.clone(),
            "verify",
            limits.verify,
            window,
        ))
        .merge(throttled_route(
            "/api/auth/login",
            post(crate::api::handlers::auth::login),
            state.limiter.clone(),
            "login",
            limits.login,
            window,
        ))
        .merge(throttled_route(
            "/api/auth/request-reset",
            post(crate::api::handlers::auth::request_password_reset),
            state.limiter.clone(),
            "reset_request",
            limits.reset_request,
            window,
        ))
        .merge(throttled_route(
            "/api/auth/reset-password",
            post(crate::api::handlers::auth::reset_password),
            state.limiter.clone(),
            "reset",
            limits.reset,
            window,
        ))
        .route("/api/health", get(crate::api::handlers::health::health));

    let auth_state = state.clone();
    let protected_routes = Router::new()
        .merge(throttled_route(
            "/api/auth/me",
            get(crate::api::handlers::auth::me).put(crate::api::handlers::auth::update_profile),
            state.limiter.clone(),
            "profile",
            limits.profile,
            window,
        ))
        .route("/api/admin/users", get(crate::api::handlers::admin::list_users))
        .route(
            "/api/admin/users/{id}/delete",
            post(crate::api::handlers::admin::delete_user),
        )
        .route(
            "/api/admin/purge",
            post(crate::api::handlers::admin::purge_deleted),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth_middleware(auth_state.clone(), req, next)
        }));

    let maintenance_state = state.clone();
    public_routes
        .merge(protected_routes)
        .layer(middleware::from_fn(move |req, next| {
            maintenance_middleware(maintenance_state.clone(), req, next)
        }))
        .with_state(state)
}

/// A single route wrapped in its own rate-limit bucket.
fn throttled_route(
    path: &str,
    handler: axum::routing::MethodRouter<AppState>,
    limiter: Arc<RateLimiter>,
    bucket: &'static str,
    limit: u32,
    window: Duration,
) -> Router<AppState> {
    Router::new()
        .route(path, handler)
        .layer(middleware::from_fn(move |req, next| {
            rate_limit_middleware(limiter.clone(), bucket, limit, window, req, next)
        }))
}
