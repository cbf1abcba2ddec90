use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Append-only record of security-relevant events.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event: String,
    pub detail: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub const EVENT_LOGIN: &str = "login";
pub const EVENT_PASSWORD_CHANGE: &str = "password_change";
pub const EVENT_PASSWORD_RESET: &str = "password_reset";
pub const EVENT_EMAIL_CHANGE: &str = "email_change";

pub async fn record(
    db: &PgPool,
    user_id: Uuid,
    event: &str,
    detail: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (user_id, event, detail)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(event)
    .bind(detail)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<AuditEntry>> {
    let rows = sqlx::query_as::<_, AuditEntry>(
        r#"
        SELECT id, user_id, event, detail, created_at
        FROM audit_logs
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
