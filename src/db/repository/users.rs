use sqlx::PgPool;

use crate::db::models::{NewUser, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, is_verified, is_active, is_admin, created_at, updated_at";

pub async fn create(pool: &PgPool, user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, email, password_hash, is_verified, is_active)
        VALUES ($1, $2, $3, $4, true)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_verified)
    .fetch_one(pool)
    .await
}

/// Active users only; a disabled account behaves as if it did not exist.
pub async fn find_active_by_id(pool: &PgPool, id: i32) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active = true"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
        .bind(email)
        .fetch_one(pool)
        .await
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await
}

/// Full-row update of the user-editable fields.
pub async fn update(pool: &PgPool, user: &User) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET username = $1, email = $2, is_verified = $3, updated_at = now()
        WHERE id = $4
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&user.username)
    .bind(&user.email)
    .bind(user.is_verified)
    .bind(user.id)
    .fetch_one(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    id: i32,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns false when no user has that email.
pub async fn set_admin_by_email(
    pool: &PgPool,
    email: &str,
    is_admin: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET is_admin = $1, updated_at = now() WHERE LOWER(email) = LOWER($2)",
    )
    .bind(is_admin)
    .bind(email)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
