use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::instrument;

use crate::{
    auth::services::AuthUser,
    error::ApiError,
    insights::{
        dto::{ActivityPoint, ActivityQuery, StreakResponse, TrendMetric, TrendPoint, TrendQuery},
        repo::{self, MoodColumn},
        service,
    },
    state::AppState,
    trackables::repo as trackables_repo,
};

/// Streak lookback. A run longer than this is reported capped, which in
/// practice means over a year of unbroken daily logging.
const STREAK_WINDOW_DAYS: i64 = 400;

pub fn insight_routes() -> Router<AppState> {
    Router::new()
        .route("/insights/trends", get(trends))
        .route("/insights/activity", get(activity))
        .route("/insights/streak", get(streak))
}

fn window_start(days: i64) -> OffsetDateTime {
    let today = OffsetDateTime::now_utc().date();
    let start = today - Duration::days(days - 1);
    start.midnight().assume_utc()
}

#[instrument(skip(state))]
pub async fn trends(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<TrendQuery>,
) -> Result<Json<Vec<TrendPoint>>, ApiError> {
    let days = service::window_days(q.days);
    let start = window_start(days);

    let samples = match q.metric {
        TrendMetric::Mood => {
            repo::mood_samples(&state.db, user_id, MoodColumn::MoodScore, start).await?
        }
        TrendMetric::Energy => {
            repo::mood_samples(&state.db, user_id, MoodColumn::EnergyLevel, start).await?
        }
        TrendMetric::Stress => {
            repo::mood_samples(&state.db, user_id, MoodColumn::StressLevel, start).await?
        }
        TrendMetric::Symptom => {
            let symptom_id = q
                .symptom_id
                .ok_or_else(|| ApiError::validation("symptomId is required for metric=symptom"))?;
            trackables_repo::find_symptom(&state.db, user_id, symptom_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Symptom not found"))?;
            repo::symptom_samples(&state.db, user_id, symptom_id, start).await?
        }
    };

    let daily: Vec<_> = samples
        .into_iter()
        .map(|(at, value)| (at.date(), value as f64))
        .collect();
    Ok(Json(service::bucket_daily(&daily)))
}

#[instrument(skip(state))]
pub async fn activity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityPoint>>, ApiError> {
    let days = service::window_days(q.days);
    let timestamps =
        repo::activity_timestamps(&state.db, user_id, window_start(days)).await?;
    let dates: Vec<_> = timestamps.into_iter().map(|at| at.date()).collect();
    Ok(Json(service::daily_counts(&dates)))
}

#[instrument(skip(state))]
pub async fn streak(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<StreakResponse>, ApiError> {
    let timestamps =
        repo::activity_timestamps(&state.db, user_id, window_start(STREAK_WINDOW_DAYS)).await?;
    let active_days = timestamps.into_iter().map(|at| at.date()).collect();
    let current_streak =
        service::current_streak(&active_days, OffsetDateTime::now_utc().date());
    Ok(Json(StreakResponse { current_streak }))
}
