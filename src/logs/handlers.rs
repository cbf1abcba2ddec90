use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::services::AuthUser,
    dates::parse_iso_date,
    error::ApiError,
    logs::{
        dto::{
            CreateHabitLogRequest, CreateMedicationLogRequest, CreateMoodLogRequest,
            CreateSymptomLogRequest, HabitValue, LogListQuery,
        },
        repo::{self, HabitLog, LogTable, MedicationLog, MoodLog, SymptomLog},
    },
    state::AppState,
    trackables::{dto::TrackingType, repo as trackables_repo},
};

pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/logs/symptoms", get(list_symptom_logs).post(create_symptom_log))
        .route("/logs/symptoms/:id", delete(delete_symptom_log))
        .route("/logs/mood", get(list_mood_logs).post(create_mood_log))
        .route("/logs/mood/:id", delete(delete_mood_log))
        .route(
            "/logs/medications",
            get(list_medication_logs).post(create_medication_log),
        )
        .route("/logs/medications/:id", delete(delete_medication_log))
        .route("/logs/habits", get(list_habit_logs).post(create_habit_log))
        .route("/logs/habits/:id", delete(delete_habit_log))
}

fn check_range(value: i32, lo: i32, hi: i32, what: &str) -> Result<(), ApiError> {
    if value < lo || value > hi {
        return Err(ApiError::Validation(format!(
            "{what} must be between {lo} and {hi}"
        )));
    }
    Ok(())
}

/// Translates optional `startDate`/`endDate` (inclusive calendar dates) into
/// a half-open timestamp range.
fn parse_range(
    q: &LogListQuery,
) -> Result<(Option<OffsetDateTime>, Option<OffsetDateTime>), ApiError> {
    let start = match &q.start_date {
        Some(s) => Some(
            parse_iso_date(s)
                .ok_or_else(|| ApiError::validation("startDate must be YYYY-MM-DD"))?
                .midnight()
                .assume_utc(),
        ),
        None => None,
    };
    let end = match &q.end_date {
        Some(s) => {
            let d = parse_iso_date(s)
                .ok_or_else(|| ApiError::validation("endDate must be YYYY-MM-DD"))?;
            let next = d
                .next_day()
                .ok_or_else(|| ApiError::validation("endDate out of range"))?;
            Some(next.midnight().assume_utc())
        }
        None => None,
    };
    Ok((start, end))
}

// --- symptom logs ---

#[instrument(skip(state))]
pub async fn list_symptom_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<LogListQuery>,
) -> Result<Json<Vec<SymptomLog>>, ApiError> {
    let (start, end) = parse_range(&q)?;
    let rows =
        repo::list_symptom_logs(&state.db, user_id, start, end, q.limit, q.offset).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, payload))]
pub async fn create_symptom_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateSymptomLogRequest>,
) -> Result<(StatusCode, Json<SymptomLog>), ApiError> {
    check_range(payload.severity, 1, 10, "severity")?;
    trackables_repo::find_symptom(&state.db, user_id, payload.symptom_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Symptom not found"))?;

    let row = repo::insert_symptom_log(
        &state.db,
        user_id,
        payload.symptom_id,
        payload.severity,
        payload.notes.as_deref(),
        payload.logged_at.unwrap_or_else(OffsetDateTime::now_utc),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn delete_symptom_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !repo::delete_log(&state.db, LogTable::Symptom, user_id, id).await? {
        return Err(ApiError::not_found("Log not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- mood logs ---

#[instrument(skip(state))]
pub async fn list_mood_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<LogListQuery>,
) -> Result<Json<Vec<MoodLog>>, ApiError> {
    let (start, end) = parse_range(&q)?;
    let rows = repo::list_mood_logs(&state.db, user_id, start, end, q.limit, q.offset).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, payload))]
pub async fn create_mood_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateMoodLogRequest>,
) -> Result<(StatusCode, Json<MoodLog>), ApiError> {
    check_range(payload.mood_score, 1, 5, "mood_score")?;
    if let Some(v) = payload.energy_level {
        check_range(v, 1, 5, "energy_level")?;
    }
    if let Some(v) = payload.stress_level {
        check_range(v, 1, 5, "stress_level")?;
    }

    let row = repo::insert_mood_log(
        &state.db,
        user_id,
        payload.mood_score,
        payload.energy_level,
        payload.stress_level,
        payload.notes.as_deref(),
        payload.logged_at.unwrap_or_else(OffsetDateTime::now_utc),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn delete_mood_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !repo::delete_log(&state.db, LogTable::Mood, user_id, id).await? {
        return Err(ApiError::not_found("Log not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- medication logs ---

#[instrument(skip(state))]
pub async fn list_medication_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<LogListQuery>,
) -> Result<Json<Vec<MedicationLog>>, ApiError> {
    let (start, end) = parse_range(&q)?;
    let rows =
        repo::list_medication_logs(&state.db, user_id, start, end, q.limit, q.offset).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, payload))]
pub async fn create_medication_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateMedicationLogRequest>,
) -> Result<(StatusCode, Json<MedicationLog>), ApiError> {
    trackables_repo::find_medication(&state.db, user_id, payload.medication_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Medication not found"))?;

    // taken_at only makes sense for a dose that was taken.
    let taken_at = if payload.taken {
        Some(payload.taken_at.unwrap_or_else(OffsetDateTime::now_utc))
    } else {
        None
    };

    let row = repo::insert_medication_log(
        &state.db,
        user_id,
        payload.medication_id,
        payload.taken,
        taken_at,
        payload.notes.as_deref(),
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn delete_medication_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !repo::delete_log(&state.db, LogTable::Medication, user_id, id).await? {
        return Err(ApiError::not_found("Log not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- habit logs ---

#[instrument(skip(state))]
pub async fn list_habit_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<LogListQuery>,
) -> Result<Json<Vec<HabitLog>>, ApiError> {
    let (start, end) = parse_range(&q)?;
    let rows = repo::list_habit_logs(&state.db, user_id, start, end, q.limit, q.offset).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, payload))]
pub async fn create_habit_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateHabitLogRequest>,
) -> Result<(StatusCode, Json<HabitLog>), ApiError> {
    let habit = trackables_repo::find_habit(&state.db, user_id, payload.habit_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Habit not found"))?;

    let tracking_type = TrackingType::parse(&habit.tracking_type)
        .ok_or_else(|| anyhow::anyhow!("habit {} has unknown tracking type", habit.id))?;
    let value = HabitValue::from_fields(
        tracking_type,
        payload.value_boolean,
        payload.value_numeric,
        payload.value_duration,
    )
    .ok_or_else(|| {
        ApiError::Validation(format!(
            "Habit tracks a {} value",
            tracking_type.as_str()
        ))
    })?;

    let row = repo::insert_habit_log(
        &state.db,
        user_id,
        payload.habit_id,
        value,
        payload.notes.as_deref(),
        payload.logged_at.unwrap_or_else(OffsetDateTime::now_utc),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn delete_habit_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !repo::delete_log(&state.db, LogTable::Habit, user_id, id).await? {
        return Err(ApiError::not_found("Log not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
