use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::json;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    audit,
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, LogoutRequest, PublicUser,
            RefreshRequest, RegisterRequest, ResetPasswordRequest,
        },
        repo::{self, User},
        services::{
            generate_reset_token, hash_password, hash_reset_token, is_valid_email,
            verify_password, JwtKeys,
        },
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

/// Sign an access/refresh pair and persist the refresh row.
async fn issue_pair(state: &AppState, user: &User) -> anyhow::Result<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id, &user.email)?;
    let (refresh_token, expires_at) = keys.sign_refresh(user.id)?;
    repo::insert_refresh_token(&state.db, user.id, &refresh_token, expires_at).await?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        &payload.email,
        &hash,
        payload.display_name.as_deref(),
    )
    .await?;

    let response = issue_pair(&state, &user).await?;
    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    // Unknown email and wrong password return the identical response, so a
    // caller cannot enumerate accounts.
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!("login with unknown email");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let response = issue_pair(&state, &user).await?;
    audit::record(&state.db, user.id, audit::EVENT_LOGIN, None).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized("Invalid refresh token".into()))?;

    // Single-use: the stored row is deleted before a new pair is issued, so
    // replaying a rotated token (or losing the race) always fails here.
    if !repo::consume_refresh_token(&state.db, &payload.refresh_token).await? {
        warn!(user_id = %claims.sub, "refresh token already rotated or revoked");
        return Err(ApiError::Unauthorized("Invalid refresh token".into()));
    }

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".into()))?;

    let response = issue_pair(&state, &user).await?;
    info!(user_id = %user.id, "refresh token rotated");
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Idempotent: deleting an already-absent token still reports success.
    repo::delete_refresh_token(&state.db, &payload.refresh_token).await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if let Some(user) = User::find_by_email(&state.db, &payload.email).await? {
        repo::invalidate_unused_reset_tokens(&state.db, user.id).await?;

        let raw = generate_reset_token();
        let expires_at = OffsetDateTime::now_utc()
            + TimeDuration::minutes(state.config.reset_token_ttl_minutes);
        repo::insert_reset_token(&state.db, user.id, &hash_reset_token(&raw), expires_at).await?;

        let body = format!(
            "A password reset was requested for your account.\n\
             Reset token: {raw}\n\
             The token expires in {} minutes.",
            state.config.reset_token_ttl_minutes
        );
        if let Err(e) = state
            .notifier
            .send(&user.email, "Password reset", &body)
            .await
        {
            warn!(user_id = %user.id, error = %e, "reset notification failed");
        }
    }

    // The response never reveals whether the email exists.
    Ok(Json(
        json!({ "message": "If the email exists, a reset link has been sent" }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if payload.password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    let token = repo::find_reset_token(&state.db, &hash_reset_token(&payload.token))
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired reset token".into()))?;

    if token.used || token.expires_at < OffsetDateTime::now_utc() {
        return Err(ApiError::BadRequest("Invalid or expired reset token".into()));
    }

    let hash = hash_password(&payload.password)?;
    User::update_password(&state.db, token.user_id, &hash).await?;
    repo::mark_reset_token_used(&state.db, token.id).await?;

    // Every open session must log in again with the new password.
    let revoked = repo::delete_all_refresh_tokens(&state.db, token.user_id).await?;
    audit::record(&state.db, token.user_id, audit::EVENT_PASSWORD_RESET, None).await?;
    info!(user_id = %token.user_id, revoked, "password reset completed");

    Ok(Json(json!({ "message": "Password updated" })))
}
