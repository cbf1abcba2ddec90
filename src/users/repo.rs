use sqlx::PgPool;
use uuid::Uuid;

pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    display_name: Option<&str>,
    timezone: Option<&str>,
    digest_opt_in: Option<bool>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET display_name = COALESCE($2, display_name),
            timezone = COALESCE($3, timezone),
            digest_opt_in = COALESCE($4, digest_opt_in)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(display_name)
    .bind(timezone)
    .bind(digest_opt_in)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn update_email(db: &PgPool, id: Uuid, email: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET email = $2 WHERE id = $1")
        .bind(id)
        .bind(email)
        .execute(db)
        .await?;
    Ok(())
}

/// Cascades to every owned row via the schema's ON DELETE CASCADE.
pub async fn delete_user(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
