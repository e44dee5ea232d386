//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Custos, built on the Axum web
//! framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Authentication (`/api/auth`)
//! - `POST /api/auth/register` - Register new user
//! - `POST /api/auth/verify-email` - Confirm an email address
//! - `POST /api/auth/login` - Login and receive a signed session token
//! - `POST /api/auth/request-reset` - Request a password-reset token
//! - `POST /api/auth/reset-password` - Reset the password with that token
//! - `GET /api/auth/me` - Fetch the caller's profile
//! - `PUT /api/auth/me` - Update display name and password
//!
//! ## Admin (`/api/admin`)
//! - `GET /api/admin/users` - List accounts
//! - `POST /api/admin/users/{id}/delete` - Soft-delete an account
//! - `POST /api/admin/purge` - Hard-delete accounts past retention
//!
//! ## Health (`/api/health`)
//! - `GET /api/health` - Health check endpoint
//!
//! # Authentication
//!
//! Protected endpoints accept either a long-lived `x-api-key` header or a
//! session token in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! # Rate Limiting
//!
//! Every public auth endpoint is throttled per caller origin; limits are
//! configured per bucket in [`RateLimitConfig`](crate::utils::config::RateLimitConfig).

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
