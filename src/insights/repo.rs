use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

/// Mood sub-metrics that can be trended. Column names are fixed here, never
/// interpolated from user input.
#[derive(Debug, Clone, Copy)]
pub enum MoodColumn {
    MoodScore,
    EnergyLevel,
    StressLevel,
}

impl MoodColumn {
    fn name(&self) -> &'static str {
        match self {
            MoodColumn::MoodScore => "mood_score",
            MoodColumn::EnergyLevel => "energy_level",
            MoodColumn::StressLevel => "stress_level",
        }
    }
}

/// Timestamped samples of one mood column; NULL sub-metrics are excluded
/// rather than treated as zero.
pub async fn mood_samples(
    db: &PgPool,
    user_id: Uuid,
    column: MoodColumn,
    start: OffsetDateTime,
) -> anyhow::Result<Vec<(OffsetDateTime, i32)>> {
    let col = column.name();
    let sql = format!(
        "SELECT logged_at, {col} AS value FROM mood_logs \
         WHERE user_id = $1 AND logged_at >= $2 AND {col} IS NOT NULL"
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(start)
        .fetch_all(db)
        .await?;
    rows.iter()
        .map(|row| Ok((row.try_get("logged_at")?, row.try_get("value")?)))
        .collect()
}

pub async fn symptom_samples(
    db: &PgPool,
    user_id: Uuid,
    symptom_id: Uuid,
    start: OffsetDateTime,
) -> anyhow::Result<Vec<(OffsetDateTime, i32)>> {
    let rows = sqlx::query(
        "SELECT logged_at, severity FROM symptom_logs \
         WHERE user_id = $1 AND symptom_id = $2 AND logged_at >= $3",
    )
    .bind(user_id)
    .bind(symptom_id)
    .bind(start)
    .fetch_all(db)
    .await?;
    rows.iter()
        .map(|row| Ok((row.try_get("logged_at")?, row.try_get("severity")?)))
        .collect()
}

/// Timestamps of every log of every type since `start`. Medication logs
/// count by `created_at` since a missed dose is still tracking activity.
pub async fn activity_timestamps(
    db: &PgPool,
    user_id: Uuid,
    start: OffsetDateTime,
) -> anyhow::Result<Vec<OffsetDateTime>> {
    let rows = sqlx::query(
        "SELECT logged_at AS at FROM symptom_logs WHERE user_id = $1 AND logged_at >= $2 \
         UNION ALL \
         SELECT logged_at AS at FROM mood_logs WHERE user_id = $1 AND logged_at >= $2 \
         UNION ALL \
         SELECT created_at AS at FROM medication_logs WHERE user_id = $1 AND created_at >= $2 \
         UNION ALL \
         SELECT logged_at AS at FROM habit_logs WHERE user_id = $1 AND logged_at >= $2",
    )
    .bind(user_id)
    .bind(start)
    .fetch_all(db)
    .await?;
    rows.iter().map(|row| Ok(row.try_get("at")?)).collect()
}
