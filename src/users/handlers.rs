use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    audit::{self, AuditEntry},
    auth::{
        repo::{self as auth_repo, User},
        services::{hash_password, is_valid_email, verify_password, AuthUser},
    },
    error::ApiError,
    state::AppState,
    users::{dto::UpdateProfileRequest, repo},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/me", put(update_me))
        .route("/users/me", delete(delete_me))
        .route("/users/me/audit", get(list_audit))
}

async fn load_user(state: &AppState, user_id: uuid::Uuid) -> Result<User, ApiError> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<User>, ApiError> {
    Ok(Json(load_user(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let user = load_user(&state, user_id).await?;

    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::validation("Invalid email"));
        }
        if email != user.email {
            if User::find_by_email(&state.db, &email).await?.is_some() {
                return Err(ApiError::Conflict("Email already registered".into()));
            }
            repo::update_email(&state.db, user_id, &email).await?;
            audit::record(
                &state.db,
                user_id,
                audit::EVENT_EMAIL_CHANGE,
                Some(&format!("{} -> {}", user.email, email)),
            )
            .await?;
            info!(user_id = %user_id, "email changed");
        }
    }

    if let Some(new_password) = payload.new_password {
        if new_password.len() < 8 {
            return Err(ApiError::validation(
                "Password must be at least 8 characters",
            ));
        }
        let current = payload
            .current_password
            .ok_or_else(|| ApiError::validation("Current password is required"))?;
        if !verify_password(&current, &user.password_hash)? {
            warn!(user_id = %user_id, "password change with wrong current password");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
        let hash = hash_password(&new_password)?;
        User::update_password(&state.db, user_id, &hash).await?;
        // A password change revokes every session, like a reset does.
        auth_repo::delete_all_refresh_tokens(&state.db, user_id).await?;
        audit::record(&state.db, user_id, audit::EVENT_PASSWORD_CHANGE, None).await?;
        info!(user_id = %user_id, "password changed");
    }

    repo::update_profile(
        &state.db,
        user_id,
        payload.display_name.as_deref(),
        payload.timezone.as_deref(),
        payload.digest_opt_in,
    )
    .await?;

    Ok(Json(load_user(&state, user_id).await?))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    repo::delete_user(&state.db, user_id).await?;
    info!(user_id = %user_id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default = "default_audit_limit")]
    pub limit: i64,
}

fn default_audit_limit() -> i64 {
    50
}

#[instrument(skip(state))]
pub async fn list_audit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let entries = audit::list_for_user(&state.db, user_id, q.limit.clamp(1, 200)).await?;
    Ok(Json(entries))
}
