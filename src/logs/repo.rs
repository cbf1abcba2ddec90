use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::logs::dto::HabitValue;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SymptomLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symptom_id: Uuid,
    pub severity: i32,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MoodLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood_score: i32,
    pub energy_level: Option<i32>,
    pub stress_level: Option<i32>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MedicationLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub medication_id: Uuid,
    pub taken: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub taken_at: Option<OffsetDateTime>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HabitLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub habit_id: Uuid,
    pub value_boolean: Option<bool>,
    pub value_numeric: Option<f64>,
    pub value_duration: Option<i32>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
}

fn range_clause(column: &str) -> String {
    format!(
        "user_id = $1 AND ($2::timestamptz IS NULL OR {column} >= $2) \
         AND ($3::timestamptz IS NULL OR {column} < $3)"
    )
}

pub async fn insert_symptom_log(
    db: &PgPool,
    user_id: Uuid,
    symptom_id: Uuid,
    severity: i32,
    notes: Option<&str>,
    logged_at: OffsetDateTime,
) -> anyhow::Result<SymptomLog> {
    let row = sqlx::query_as::<_, SymptomLog>(
        r#"
        INSERT INTO symptom_logs (user_id, symptom_id, severity, notes, logged_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, symptom_id, severity, notes, logged_at
        "#,
    )
    .bind(user_id)
    .bind(symptom_id)
    .bind(severity)
    .bind(notes)
    .bind(logged_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_symptom_logs(
    db: &PgPool,
    user_id: Uuid,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<SymptomLog>> {
    let sql = format!(
        "SELECT id, user_id, symptom_id, severity, notes, logged_at FROM symptom_logs \
         WHERE {} ORDER BY logged_at DESC LIMIT $4 OFFSET $5",
        range_clause("logged_at")
    );
    let rows = sqlx::query_as::<_, SymptomLog>(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn insert_mood_log(
    db: &PgPool,
    user_id: Uuid,
    mood_score: i32,
    energy_level: Option<i32>,
    stress_level: Option<i32>,
    notes: Option<&str>,
    logged_at: OffsetDateTime,
) -> anyhow::Result<MoodLog> {
    let row = sqlx::query_as::<_, MoodLog>(
        r#"
        INSERT INTO mood_logs (user_id, mood_score, energy_level, stress_level, notes, logged_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, mood_score, energy_level, stress_level, notes, logged_at
        "#,
    )
    .bind(user_id)
    .bind(mood_score)
    .bind(energy_level)
    .bind(stress_level)
    .bind(notes)
    .bind(logged_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_mood_logs(
    db: &PgPool,
    user_id: Uuid,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<MoodLog>> {
    let sql = format!(
        "SELECT id, user_id, mood_score, energy_level, stress_level, notes, logged_at \
         FROM mood_logs WHERE {} ORDER BY logged_at DESC LIMIT $4 OFFSET $5",
        range_clause("logged_at")
    );
    let rows = sqlx::query_as::<_, MoodLog>(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn insert_medication_log(
    db: &PgPool,
    user_id: Uuid,
    medication_id: Uuid,
    taken: bool,
    taken_at: Option<OffsetDateTime>,
    notes: Option<&str>,
    created_at: OffsetDateTime,
) -> anyhow::Result<MedicationLog> {
    let row = sqlx::query_as::<_, MedicationLog>(
        r#"
        INSERT INTO medication_logs (user_id, medication_id, taken, taken_at, notes, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, medication_id, taken, taken_at, notes, created_at
        "#,
    )
    .bind(user_id)
    .bind(medication_id)
    .bind(taken)
    .bind(taken_at)
    .bind(notes)
    .bind(created_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_medication_logs(
    db: &PgPool,
    user_id: Uuid,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<MedicationLog>> {
    let sql = format!(
        "SELECT id, user_id, medication_id, taken, taken_at, notes, created_at \
         FROM medication_logs WHERE {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
        range_clause("created_at")
    );
    let rows = sqlx::query_as::<_, MedicationLog>(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn insert_habit_log(
    db: &PgPool,
    user_id: Uuid,
    habit_id: Uuid,
    value: HabitValue,
    notes: Option<&str>,
    logged_at: OffsetDateTime,
) -> anyhow::Result<HabitLog> {
    let (boolean, numeric, duration) = value.into_fields();
    let row = sqlx::query_as::<_, HabitLog>(
        r#"
        INSERT INTO habit_logs
            (user_id, habit_id, value_boolean, value_numeric, value_duration, notes, logged_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, habit_id, value_boolean, value_numeric, value_duration,
                  notes, logged_at
        "#,
    )
    .bind(user_id)
    .bind(habit_id)
    .bind(boolean)
    .bind(numeric)
    .bind(duration)
    .bind(notes)
    .bind(logged_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_habit_logs(
    db: &PgPool,
    user_id: Uuid,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<HabitLog>> {
    let sql = format!(
        "SELECT id, user_id, habit_id, value_boolean, value_numeric, value_duration, notes, \
         logged_at FROM habit_logs WHERE {} ORDER BY logged_at DESC LIMIT $4 OFFSET $5",
        range_clause("logged_at")
    );
    let rows = sqlx::query_as::<_, HabitLog>(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Deletes scoped to the owner; 0 rows means absent or someone else's.
pub async fn delete_log(db: &PgPool, table: LogTable, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = $1 AND user_id = $2", table.name());
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, Copy)]
pub enum LogTable {
    Symptom,
    Mood,
    Medication,
    Habit,
}

impl LogTable {
    fn name(&self) -> &'static str {
        match self {
            LogTable::Symptom => "symptom_logs",
            LogTable::Mood => "mood_logs",
            LogTable::Medication => "medication_logs",
            LogTable::Habit => "habit_logs",
        }
    }
}
