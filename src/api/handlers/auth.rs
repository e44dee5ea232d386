use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    auth::{hasher::random_token, middleware::ClientIp, CurrentUser},
    db::{Account, SessionRecord},
    types::{
        AppError, LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RegisterResponse,
        ResetPasswordRequest, ResetRequestBody, ResetRequestResponse, Result, Role,
        UpdateProfileRequest, UserSummary, VerifyEmailRequest,
    },
    AppState,
};

use super::audit;

/// Verification-token byte length (hex-encodes to twice this).
const VERIFICATION_TOKEN_LEN: usize = 16;
/// Successful logins remembered per account.
const SESSION_HISTORY_LIMIT: usize = 5;
/// Minimum password length, enforced on every path that installs one.
const MIN_PASSWORD_LEN: usize = 8;

fn check_password_length(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered; verification token returned", body = RegisterResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::InvalidInput(
            "name, email and password are required".to_string(),
        ));
    }
    check_password_length(&payload.password)?;

    // Lookup on the trimmed email, the same form that gets stored
    if state.store.get_by_email(email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let now = Utc::now();
    let salt = state.hasher.generate_salt();
    let hash = state.hasher.hash(&payload.password, &salt)?;

    // Verification token returned in the response, simulating email delivery
    let verification_token = random_token(VERIFICATION_TOKEN_LEN);

    // History seeded with the first password
    let mut password_history = Vec::new();
    state
        .history
        .record_change(&mut password_history, hash.clone(), salt.clone(), now);

    let account = Account {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash,
        password_salt: salt,
        role: Role::Member,
        is_deleted: false,
        deleted_at: None,
        failed_attempts: 0,
        locked_until: None,
        verification_token: Some(verification_token.clone()),
        is_verified: false,
        reset_token: None,
        reset_token_expiry: None,
        sessions: Vec::new(),
        password_history,
        api_key: None,
        created_at: now,
    };

    state.store.create_account(&account).await?;

    audit(
        &state,
        Some(account.id.clone()),
        "register",
        serde_json::json!({ "email": account.email }),
        ip,
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registered. Verify using token".to_string(),
            verification_token,
        }),
    ))
}

/// Confirm an email address with the token issued at registration
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified (or already verified)", body = MessageResponse),
        (status = 401, description = "Invalid token")
    ),
    tag = "auth"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>> {
    let mut account = state
        .store
        .get_by_email(&payload.email)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    if account.is_verified {
        return Ok(Json(MessageResponse::new("Already verified")));
    }

    let stored = account
        .verification_token
        .as_deref()
        .ok_or(AppError::TokenInvalid)?;
    if !bool::from(stored.as_bytes().ct_eq(payload.token.as_bytes())) {
        return Err(AppError::TokenInvalid);
    }

    account.is_verified = true;
    account.verification_token = None;
    state.store.save(&account).await?;

    audit(
        &state,
        Some(account.id.clone()),
        "verify_email",
        serde_json::json!({}),
        ip,
    );

    Ok(Json(MessageResponse::new("Email verified")))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let mut account = state
        .store
        .get_by_email(&payload.email)
        .await?
        .filter(|a| !a.is_deleted)
        .ok_or(AppError::InvalidCredentials)?;

    let now = Utc::now();

    // Lock check comes before credential verification; the response is
    // indistinguishable from a wrong password.
    if state.throttle.is_locked(&account, now) {
        tracing::info!(account_id = %account.id, "login attempt on locked account");
        return Err(AppError::AccountLocked);
    }

    let ok = state
        .hasher
        .verify(&payload.password, &account.password_salt, &account.password_hash);
    if !ok {
        state.throttle.record_failure(&mut account, now);
        state.store.save(&account).await?;
        audit(
            &state,
            Some(account.id.clone()),
            "failed_login",
            serde_json::json!({}),
            ip,
        );
        return Err(AppError::InvalidCredentials);
    }

    state.throttle.record_success(&mut account);

    account.sessions.insert(
        0,
        SessionRecord {
            at: now,
            ip: ip.clone(),
        },
    );
    account.sessions.truncate(SESSION_HISTORY_LIMIT);

    state.store.save(&account).await?;

    let token = state.tokens.sign(&account.id, account.role)?;

    audit(
        &state,
        Some(account.id.clone()),
        "login",
        serde_json::json!({}),
        ip,
    );

    Ok(Json(LoginResponse {
        token,
        user: account.summary(),
    }))
}

/// Request a password-reset token
#[utoipa::path(
    post,
    path = "/api/auth/request-reset",
    request_body = ResetRequestBody,
    responses(
        (status = 200, description = "Reset token issued", body = ResetRequestResponse),
        (status = 404, description = "Unknown email")
    ),
    tag = "auth"
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<ResetRequestBody>,
) -> Result<Json<ResetRequestResponse>> {
    let mut account = state
        .store
        .get_by_email(&payload.email)
        .await?
        .filter(|a| !a.is_deleted)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let token = state.reset.issue(&mut account, Utc::now());
    state.store.save(&account).await?;

    audit(
        &state,
        Some(account.id.clone()),
        "request_password_reset",
        serde_json::json!({}),
        ip,
    );

    Ok(Json(ResetRequestResponse {
        message: "Reset token generated".to_string(),
        reset_token: token,
    }))
}

/// Reset the password with a previously issued token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid/expired token or reused password")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let mut account = state
        .store
        .get_by_email(&payload.email)
        .await?
        .ok_or(AppError::ResetTokenInvalid)?;

    check_password_length(&payload.new_password)?;

    state.reset.consume(
        &mut account,
        &payload.token,
        &payload.new_password,
        &state.hasher,
        &state.history,
        Utc::now(),
    )?;

    state.store.save(&account).await?;

    audit(
        &state,
        Some(account.id.clone()),
        "reset_password",
        serde_json::json!({}),
        ip,
    );

    Ok(Json(MessageResponse::new("Password reset")))
}

/// Fetch the caller's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Sanitized profile", body = UserSummary),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<UserSummary>> {
    let account = state
        .store
        .get_by_id(&identity.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(account.summary()))
}

/// Update the caller's display name and, optionally, password
#[utoipa::path(
    put,
    path = "/api/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = MessageResponse),
        (status = 400, description = "Reused password"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ClientIp(ip): ClientIp,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>> {
    let mut account = state
        .store
        .get_by_id(&identity.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(name) = payload.name {
        if !name.trim().is_empty() {
            account.name = name.trim().to_string();
        }
    }

    if let Some(password) = payload.password {
        check_password_length(&password)?;
        if state
            .history
            .would_reuse(&state.hasher, &password, &account.password_history)
        {
            return Err(AppError::ReusedPassword);
        }

        let now = Utc::now();
        let salt = state.hasher.generate_salt();
        let hash = state.hasher.hash(&password, &salt)?;
        account.password_salt = salt.clone();
        account.password_hash = hash.clone();
        state
            .history
            .record_change(&mut account.password_history, hash, salt, now);
    }

    state.store.save(&account).await?;

    audit(
        &state,
        Some(account.id.clone()),
        "update_profile",
        serde_json::json!({}),
        ip,
    );

    Ok(Json(MessageResponse::new("Profile updated")))
}
