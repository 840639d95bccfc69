//! Site-wide queries for the admin dashboard.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

const LIST_LIMIT: i64 = 100;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminStats {
    pub total_users: i64,
    pub verified_users: i64,
    pub total_profiles: i64,
    pub total_links: i64,
    pub total_clicks: i64,
    pub new_users_week: i64,
    pub active_users_week: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub profile_count: i64,
    pub total_clicks: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminProfile {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub slug: String,
    pub name: String,
    pub is_active: bool,
    pub link_count: i64,
    pub total_clicks: i64,
    pub created_at: DateTime<Utc>,
}

/// "Active this week" counts distinct users that opened a session in the
/// last seven days.
pub async fn stats(pool: &PgPool) -> Result<AdminStats, sqlx::Error> {
    sqlx::query_as::<_, AdminStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE is_verified = true) AS verified_users,
            (SELECT COUNT(*) FROM profiles) AS total_profiles,
            (SELECT COUNT(*) FROM links) AS total_links,
            (SELECT COALESCE(SUM(clicks), 0)::BIGINT FROM links) AS total_clicks,
            (SELECT COUNT(*) FROM users WHERE created_at > now() - INTERVAL '7 days') AS new_users_week,
            (SELECT COUNT(DISTINCT user_id) FROM sessions WHERE created_at > now() - INTERVAL '7 days') AS active_users_week
        "#,
    )
    .fetch_one(pool)
    .await
}

const ADMIN_USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.is_verified, u.is_active, u.is_admin, u.created_at,
           (SELECT COUNT(*) FROM profiles p WHERE p.user_id = u.id) AS profile_count,
           (SELECT COALESCE(SUM(l.clicks), 0)::BIGINT FROM profiles p
              JOIN links l ON l.profile_id = p.id WHERE p.user_id = u.id) AS total_clicks
    FROM users u
"#;

/// Newest first; `search` matches username or email, case-insensitively.
pub async fn list_users(pool: &PgPool, search: &str) -> Result<Vec<AdminUser>, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>(&format!(
        r#"
        {ADMIN_USER_SELECT}
        WHERE ($1 = '' OR u.username ILIKE '%' || $1 || '%' OR u.email ILIKE '%' || $1 || '%')
        ORDER BY u.created_at DESC
        LIMIT $2
        "#
    ))
    .bind(search)
    .bind(LIST_LIMIT)
    .fetch_all(pool)
    .await
}

pub async fn find_user(pool: &PgPool, id: i32) -> Result<Option<AdminUser>, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>(&format!("{ADMIN_USER_SELECT} WHERE u.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

const ADMIN_PROFILE_SELECT: &str = r#"
    SELECT p.id, p.user_id, u.username, p.slug, p.name, p.is_active,
           (SELECT COUNT(*) FROM links l WHERE l.profile_id = p.id) AS link_count,
           (SELECT COALESCE(SUM(l.clicks), 0)::BIGINT FROM links l WHERE l.profile_id = p.id) AS total_clicks,
           p.created_at
    FROM profiles p
    JOIN users u ON u.id = p.user_id
"#;

/// Newest first; `search` matches profile name, slug or owner username.
pub async fn list_profiles(pool: &PgPool, search: &str) -> Result<Vec<AdminProfile>, sqlx::Error> {
    sqlx::query_as::<_, AdminProfile>(&format!(
        r#"
        {ADMIN_PROFILE_SELECT}
        WHERE ($1 = '' OR p.name ILIKE '%' || $1 || '%' OR p.slug ILIKE '%' || $1 || '%'
               OR u.username ILIKE '%' || $1 || '%')
        ORDER BY p.created_at DESC
        LIMIT $2
        "#
    ))
    .bind(search)
    .bind(LIST_LIMIT)
    .fetch_all(pool)
    .await
}

pub async fn profiles_of_user(pool: &PgPool, user_id: i32) -> Result<Vec<AdminProfile>, sqlx::Error> {
    sqlx::query_as::<_, AdminProfile>(&format!(
        "{ADMIN_PROFILE_SELECT} WHERE p.user_id = $1 ORDER BY p.display_order ASC, p.created_at ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Set any of the moderation flags in a single statement. Returns `None`
/// when the user does not exist.
pub async fn update_user_flags(
    pool: &PgPool,
    id: i32,
    is_verified: Option<bool>,
    is_active: Option<bool>,
    is_admin: Option<bool>,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        UPDATE users SET
            is_verified = COALESCE($1, is_verified),
            is_active = COALESCE($2, is_active),
            is_admin = COALESCE($3, is_admin),
            updated_at = now()
        WHERE id = $4
        RETURNING id
        "#,
    )
    .bind(is_verified)
    .bind(is_active)
    .bind(is_admin)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn set_profile_active(
    pool: &PgPool,
    id: i32,
    is_active: bool,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE profiles SET is_active = $1, updated_at = now() WHERE id = $2")
            .bind(is_active)
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}
