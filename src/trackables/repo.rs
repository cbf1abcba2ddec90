use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Trackables with `user_id = NULL` are system-provided: visible to every
/// user, mutable by none.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Symptom {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub category: Option<String>,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub dosage: Option<String>,
    pub unit: Option<String>,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub tracking_type: String,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// --- symptoms ---

pub async fn list_symptoms(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Symptom>> {
    let rows = sqlx::query_as::<_, Symptom>(
        r#"
        SELECT id, user_id, name, category, active, created_at
        FROM symptoms
        WHERE user_id IS NULL OR user_id = $1
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// System rows and the caller's own rows; other users' rows are invisible.
pub async fn find_symptom(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Symptom>> {
    let row = sqlx::query_as::<_, Symptom>(
        r#"
        SELECT id, user_id, name, category, active, created_at
        FROM symptoms
        WHERE id = $1 AND (user_id IS NULL OR user_id = $2)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create_symptom(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    category: Option<&str>,
) -> anyhow::Result<Symptom> {
    let row = sqlx::query_as::<_, Symptom>(
        r#"
        INSERT INTO symptoms (user_id, name, category)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, name, category, active, created_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(category)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update_symptom(
    db: &PgPool,
    id: Uuid,
    name: Option<&str>,
    category: Option<&str>,
    active: Option<bool>,
) -> anyhow::Result<Symptom> {
    let row = sqlx::query_as::<_, Symptom>(
        r#"
        UPDATE symptoms
        SET name = COALESCE($2, name),
            category = COALESCE($3, category),
            active = COALESCE($4, active)
        WHERE id = $1
        RETURNING id, user_id, name, category, active, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(category)
    .bind(active)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn delete_symptom(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM symptoms WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

// --- medications ---

/// Medications are never system-provided; the list is the caller's own.
pub async fn list_medications(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Medication>> {
    let rows = sqlx::query_as::<_, Medication>(
        r#"
        SELECT id, user_id, name, dosage, unit, active, created_at
        FROM medications
        WHERE user_id = $1
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_medication(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> anyhow::Result<Option<Medication>> {
    let row = sqlx::query_as::<_, Medication>(
        r#"
        SELECT id, user_id, name, dosage, unit, active, created_at
        FROM medications
        WHERE id = $1 AND (user_id IS NULL OR user_id = $2)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create_medication(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    dosage: Option<&str>,
    unit: Option<&str>,
) -> anyhow::Result<Medication> {
    let row = sqlx::query_as::<_, Medication>(
        r#"
        INSERT INTO medications (user_id, name, dosage, unit)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, name, dosage, unit, active, created_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(dosage)
    .bind(unit)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update_medication(
    db: &PgPool,
    id: Uuid,
    name: Option<&str>,
    dosage: Option<&str>,
    unit: Option<&str>,
    active: Option<bool>,
) -> anyhow::Result<Medication> {
    let row = sqlx::query_as::<_, Medication>(
        r#"
        UPDATE medications
        SET name = COALESCE($2, name),
            dosage = COALESCE($3, dosage),
            unit = COALESCE($4, unit),
            active = COALESCE($5, active)
        WHERE id = $1
        RETURNING id, user_id, name, dosage, unit, active, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(dosage)
    .bind(unit)
    .bind(active)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn delete_medication(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM medications WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

// --- habits ---

pub async fn list_habits(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Habit>> {
    let rows = sqlx::query_as::<_, Habit>(
        r#"
        SELECT id, user_id, name, tracking_type, active, created_at
        FROM habits
        WHERE user_id IS NULL OR user_id = $1
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_habit(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Habit>> {
    let row = sqlx::query_as::<_, Habit>(
        r#"
        SELECT id, user_id, name, tracking_type, active, created_at
        FROM habits
        WHERE id = $1 AND (user_id IS NULL OR user_id = $2)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create_habit(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    tracking_type: &str,
) -> anyhow::Result<Habit> {
    let row = sqlx::query_as::<_, Habit>(
        r#"
        INSERT INTO habits (user_id, name, tracking_type)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, name, tracking_type, active, created_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(tracking_type)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update_habit(
    db: &PgPool,
    id: Uuid,
    name: Option<&str>,
    active: Option<bool>,
) -> anyhow::Result<Habit> {
    let row = sqlx::query_as::<_, Habit>(
        r#"
        UPDATE habits
        SET name = COALESCE($2, name),
            active = COALESCE($3, active)
        WHERE id = $1
        RETURNING id, user_id, name, tracking_type, active, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(active)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn delete_habit(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM habits WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
