use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Duration, Utc};

use crate::{
    auth::{middleware::ClientIp, CurrentUser},
    types::{AppError, MessageResponse, PurgeResponse, Result, UserSummary},
    AppState,
};

use super::audit;

/// List all non-deleted accounts
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "Account summaries, newest first", body = [UserSummary]),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Vec<UserSummary>>> {
    identity.require_admin()?;

    let users = state.store.list().await?;
    Ok(Json(users))
}

/// Soft-delete an account
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/delete",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account soft-deleted", body = MessageResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    identity.require_admin()?;

    let deleted = state.store.soft_delete(&id, Utc::now()).await?;
    if !deleted {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    audit(
        &state,
        Some(identity.id.clone()),
        "admin_delete_user",
        serde_json::json!({ "target": id }),
        ip,
    );

    Ok(Json(MessageResponse::new("User deleted")))
}

/// Hard-delete soft-deleted accounts past the retention cutoff
#[utoipa::path(
    post,
    path = "/api/admin/purge",
    responses(
        (status = 200, description = "Purge completed", body = PurgeResponse),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn purge_deleted(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ClientIp(ip): ClientIp,
) -> Result<Json<PurgeResponse>> {
    identity.require_admin()?;

    let cutoff = Utc::now() - Duration::days(state.config.auth.retention_days);
    let purged = state.store.purge_deleted(cutoff).await?;

    audit(
        &state,
        Some(identity.id.clone()),
        "admin_purge",
        serde_json::json!({ "purged": purged }),
        ip,
    );

    Ok(Json(PurgeResponse {
        message: "Purge completed".to_string(),
        purged,
    }))
}
