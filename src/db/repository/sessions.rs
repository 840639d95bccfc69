use sqlx::PgPool;

use crate::db::models::{NewSession, Session};

const SESSION_COLUMNS: &str = "id, user_id, refresh_token_hash, ip, user_agent, expires_at, created_at";

pub async fn create(pool: &PgPool, session: &NewSession) -> Result<Session, sqlx::Error> {
    sqlx::query_as::<_, Session>(&format!(
        r#"
        INSERT INTO sessions (user_id, refresh_token_hash, ip, user_agent, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(session.user_id)
    .bind(&session.refresh_token_hash)
    .bind(&session.ip)
    .bind(&session.user_agent)
    .bind(session.expires_at)
    .fetch_one(pool)
    .await
}

pub async fn find_valid_by_hash(pool: &PgPool, hash: &str) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE refresh_token_hash = $1 AND expires_at > now()"
    ))
    .bind(hash)
    .fetch_optional(pool)
    .await
}

pub async fn delete_by_hash(pool: &PgPool, hash: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE refresh_token_hash = $1")
        .bind(hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_for_user(pool: &PgPool, user_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_expired_for_user(pool: &PgPool, user_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= now()")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
