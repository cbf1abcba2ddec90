use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::services::AuthUser,
    error::ApiError,
    state::AppState,
    trackables::{
        dto::{
            CreateHabitRequest, CreateMedicationRequest, CreateSymptomRequest, TrackingType,
            UpdateHabitRequest, UpdateMedicationRequest, UpdateSymptomRequest,
        },
        repo::{self, Habit, Medication, Symptom},
    },
};

pub fn trackable_routes() -> Router<AppState> {
    Router::new()
        .route("/symptoms", get(list_symptoms).post(create_symptom))
        .route("/symptoms/:id", put(update_symptom).delete(delete_symptom))
        .route("/medications", get(list_medications).post(create_medication))
        .route(
            "/medications/:id",
            put(update_medication).delete(delete_medication),
        )
        .route("/habits", get(list_habits).post(create_habit))
        .route("/habits/:id", put(update_habit).delete(delete_habit))
}

/// Mutation gate. `find_*` already hides other users' rows (404); what is
/// left is either a system row (403) or the caller's own.
fn ensure_mutable(owner: Option<Uuid>) -> Result<(), ApiError> {
    if owner.is_none() {
        return Err(ApiError::Forbidden(
            "System records cannot be modified".into(),
        ));
    }
    Ok(())
}

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    Ok(())
}

// --- symptoms ---

#[instrument(skip(state))]
pub async fn list_symptoms(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Symptom>>, ApiError> {
    Ok(Json(repo::list_symptoms(&state.db, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_symptom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateSymptomRequest>,
) -> Result<(StatusCode, Json<Symptom>), ApiError> {
    require_name(&payload.name)?;
    let row = repo::create_symptom(
        &state.db,
        user_id,
        payload.name.trim(),
        payload.category.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, payload))]
pub async fn update_symptom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSymptomRequest>,
) -> Result<Json<Symptom>, ApiError> {
    let existing = repo::find_symptom(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Symptom not found"))?;
    ensure_mutable(existing.user_id)?;
    let row = repo::update_symptom(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.category.as_deref(),
        payload.active,
    )
    .await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn delete_symptom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = repo::find_symptom(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Symptom not found"))?;
    ensure_mutable(existing.user_id)?;
    repo::delete_symptom(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- medications ---

#[instrument(skip(state))]
pub async fn list_medications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Medication>>, ApiError> {
    Ok(Json(repo::list_medications(&state.db, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_medication(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<Medication>), ApiError> {
    require_name(&payload.name)?;
    let row = repo::create_medication(
        &state.db,
        user_id,
        payload.name.trim(),
        payload.dosage.as_deref(),
        payload.unit.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, payload))]
pub async fn update_medication(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMedicationRequest>,
) -> Result<Json<Medication>, ApiError> {
    let existing = repo::find_medication(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Medication not found"))?;
    ensure_mutable(existing.user_id)?;
    let row = repo::update_medication(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.dosage.as_deref(),
        payload.unit.as_deref(),
        payload.active,
    )
    .await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn delete_medication(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = repo::find_medication(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Medication not found"))?;
    ensure_mutable(existing.user_id)?;
    repo::delete_medication(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- habits ---

#[instrument(skip(state))]
pub async fn list_habits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Habit>>, ApiError> {
    Ok(Json(repo::list_habits(&state.db, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_habit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), ApiError> {
    require_name(&payload.name)?;
    let tracking_type = match payload.tracking_type.as_deref() {
        None => TrackingType::Boolean,
        Some(s) => TrackingType::parse(s)
            .ok_or_else(|| ApiError::validation("tracking_type must be boolean, numeric or duration"))?,
    };
    let row = repo::create_habit(
        &state.db,
        user_id,
        payload.name.trim(),
        tracking_type.as_str(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, payload))]
pub async fn update_habit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateHabitRequest>,
) -> Result<Json<Habit>, ApiError> {
    let existing = repo::find_habit(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Habit not found"))?;
    ensure_mutable(existing.user_id)?;
    let row = repo::update_habit(&state.db, id, payload.name.as_deref(), payload.active).await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn delete_habit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = repo::find_habit(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Habit not found"))?;
    ensure_mutable(existing.user_id)?;
    repo::delete_habit(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
