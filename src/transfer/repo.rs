use sqlx::{FromRow, PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::trackables::dto::TrackingType;
use crate::transfer::service::{
    ExportData, HabitLogRow, MedicationLogRow, MoodLogRow, NewHabitLog, NewMedicationLog,
    NewMoodLog, NewSymptomLog, SymptomLogRow, TrackableCatalog,
};

#[derive(Debug, FromRow)]
struct SymptomExportRow {
    logged_at: OffsetDateTime,
    symptom_name: String,
    severity: i32,
    notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct MoodExportRow {
    logged_at: OffsetDateTime,
    mood_score: i32,
    energy_level: Option<i32>,
    stress_level: Option<i32>,
    notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct MedicationExportRow {
    created_at: OffsetDateTime,
    taken_at: Option<OffsetDateTime>,
    medication_name: String,
    taken: bool,
    notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct HabitExportRow {
    logged_at: OffsetDateTime,
    habit_name: String,
    value_boolean: Option<bool>,
    value_numeric: Option<f64>,
    value_duration: Option<i32>,
    notes: Option<String>,
}

fn range_clause(column: &str) -> String {
    format!(
        "($2::timestamptz IS NULL OR {column} >= $2) \
         AND ($3::timestamptz IS NULL OR {column} < $3)"
    )
}

/// Loads every section of a user's export, trackable names joined in,
/// oldest first so the file reads chronologically.
pub async fn load_export(
    db: &PgPool,
    user_id: Uuid,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
) -> anyhow::Result<ExportData> {
    let sql = format!(
        "SELECT l.logged_at, s.name AS symptom_name, l.severity, l.notes \
         FROM symptom_logs l JOIN symptoms s ON s.id = l.symptom_id \
         WHERE l.user_id = $1 AND {} ORDER BY l.logged_at ASC",
        range_clause("l.logged_at")
    );
    let symptom_logs = sqlx::query_as::<_, SymptomExportRow>(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|r| SymptomLogRow {
            logged_at: r.logged_at,
            symptom_name: r.symptom_name,
            severity: r.severity,
            notes: r.notes,
        })
        .collect();

    let sql = format!(
        "SELECT logged_at, mood_score, energy_level, stress_level, notes \
         FROM mood_logs WHERE user_id = $1 AND {} ORDER BY logged_at ASC",
        range_clause("logged_at")
    );
    let mood_logs = sqlx::query_as::<_, MoodExportRow>(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|r| MoodLogRow {
            logged_at: r.logged_at,
            mood_score: r.mood_score,
            energy_level: r.energy_level,
            stress_level: r.stress_level,
            notes: r.notes,
        })
        .collect();

    let sql = format!(
        "SELECT l.created_at, l.taken_at, m.name AS medication_name, l.taken, l.notes \
         FROM medication_logs l JOIN medications m ON m.id = l.medication_id \
         WHERE l.user_id = $1 AND {} ORDER BY l.created_at ASC",
        range_clause("l.created_at")
    );
    let medication_logs = sqlx::query_as::<_, MedicationExportRow>(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|r| MedicationLogRow {
            created_at: r.created_at,
            taken_at: r.taken_at,
            medication_name: r.medication_name,
            taken: r.taken,
            notes: r.notes,
        })
        .collect();

    let sql = format!(
        "SELECT l.logged_at, h.name AS habit_name, l.value_boolean, l.value_numeric, \
         l.value_duration, l.notes \
         FROM habit_logs l JOIN habits h ON h.id = l.habit_id \
         WHERE l.user_id = $1 AND {} ORDER BY l.logged_at ASC",
        range_clause("l.logged_at")
    );
    let habit_logs = sqlx::query_as::<_, HabitExportRow>(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|r| HabitLogRow {
            logged_at: r.logged_at,
            habit_name: r.habit_name,
            value_boolean: r.value_boolean,
            value_numeric: r.value_numeric,
            value_duration: r.value_duration,
            notes: r.notes,
        })
        .collect();

    Ok(ExportData {
        symptom_logs,
        mood_logs,
        medication_logs,
        habit_logs,
    })
}

/// Name lookups for import: system rows plus the user's own for symptoms and
/// habits, own only for medications. Ordered by creation so the oldest row
/// wins a duplicate-name tie.
pub async fn load_catalog(db: &PgPool, user_id: Uuid) -> anyhow::Result<TrackableCatalog> {
    let mut catalog = TrackableCatalog::default();

    let rows = sqlx::query(
        "SELECT id, name FROM symptoms WHERE user_id IS NULL OR user_id = $1 \
         ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    for row in rows {
        catalog.symptoms.push((row.try_get("name")?, row.try_get("id")?));
    }

    let rows = sqlx::query(
        "SELECT id, name FROM medications WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    for row in rows {
        catalog
            .medications
            .push((row.try_get("name")?, row.try_get("id")?));
    }

    let rows = sqlx::query(
        "SELECT id, name, tracking_type FROM habits WHERE user_id IS NULL OR user_id = $1 \
         ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    for row in rows {
        let raw: String = row.try_get("tracking_type")?;
        let tracking_type = TrackingType::parse(&raw)
            .ok_or_else(|| anyhow::anyhow!("habit has unknown tracking type {raw}"))?;
        catalog
            .habits
            .push((row.try_get("name")?, row.try_get("id")?, tracking_type));
    }

    Ok(catalog)
}

pub async fn insert_symptom_import(
    db: &PgPool,
    user_id: Uuid,
    log: &NewSymptomLog,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO symptom_logs (user_id, symptom_id, severity, notes, logged_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(log.symptom_id)
    .bind(log.severity)
    .bind(log.notes.as_deref())
    .bind(log.logged_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert_mood_import(
    db: &PgPool,
    user_id: Uuid,
    log: &NewMoodLog,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO mood_logs (user_id, mood_score, energy_level, stress_level, notes, logged_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(user_id)
    .bind(log.mood_score)
    .bind(log.energy_level)
    .bind(log.stress_level)
    .bind(log.notes.as_deref())
    .bind(log.logged_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert_medication_import(
    db: &PgPool,
    user_id: Uuid,
    log: &NewMedicationLog,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO medication_logs (user_id, medication_id, taken, taken_at, notes, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(user_id)
    .bind(log.medication_id)
    .bind(log.taken)
    .bind(log.taken_at)
    .bind(log.notes.as_deref())
    .bind(log.created_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert_habit_import(
    db: &PgPool,
    user_id: Uuid,
    log: &NewHabitLog,
) -> anyhow::Result<()> {
    let (boolean, numeric, duration) = log.value.into_fields();
    sqlx::query(
        "INSERT INTO habit_logs \
         (user_id, habit_id, value_boolean, value_numeric, value_duration, notes, logged_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(user_id)
    .bind(log.habit_id)
    .bind(boolean)
    .bind(numeric)
    .bind(duration)
    .bind(log.notes.as_deref())
    .bind(log.logged_at)
    .execute(db)
    .await?;
    Ok(())
}
