use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub timezone: String,
    pub digest_opt_in: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, display_name, timezone, digest_opt_in, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        display_name: Option<&str>,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, display_name)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(display_name)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }
}

pub async fn insert_refresh_token(
    db: &PgPool,
    user_id: Uuid,
    token: &str,
    expires_at: OffsetDateTime,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, token, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .execute(db)
    .await?;
    Ok(())
}

/// Single-use rotation step: delete the row matching the exact token string.
/// Returns false when the row is gone (already rotated or revoked) — of two
/// concurrent refresh calls with the same token, at most one sees true.
pub async fn consume_refresh_token(db: &PgPool, token: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
        .bind(token)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Logout path: same delete, but the outcome is not reported (idempotent).
pub async fn delete_refresh_token(db: &PgPool, token: &str) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
        .bind(token)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete_all_refresh_tokens(db: &PgPool, user_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: OffsetDateTime,
    pub used: bool,
    pub created_at: OffsetDateTime,
}

/// Issuing a new reset token retires every unused one before it.
pub async fn invalidate_unused_reset_tokens(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE user_id = $1 AND NOT used")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn insert_reset_token(
    db: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: OffsetDateTime,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_reset_token(
    db: &PgPool,
    token_hash: &str,
) -> anyhow::Result<Option<PasswordResetToken>> {
    let row = sqlx::query_as::<_, PasswordResetToken>(
        r#"
        SELECT id, user_id, token_hash, expires_at, used, created_at
        FROM password_reset_tokens
        WHERE token_hash = $1
        "#,
    )
    .bind(token_hash)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn mark_reset_token_used(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
