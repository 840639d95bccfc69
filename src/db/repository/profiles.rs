use sqlx::PgPool;

use crate::db::models::{NewProfile, Profile, ProfileWithStats};

const PROFILE_COLUMNS: &str =
    "id, user_id, slug, name, title, bio, avatar, is_active, display_order, created_at, updated_at";

pub const DEFAULT_AVATAR: &str = "default-avatar.png";

/// Insert a profile together with its default theme in one transaction.
pub async fn create(pool: &PgPool, profile: &NewProfile) -> Result<Profile, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let created = sqlx::query_as::<_, Profile>(&format!(
        r#"
        INSERT INTO profiles (user_id, slug, name, title, bio, avatar, is_active, display_order)
        VALUES ($1, $2, $3, $4, $5, $6, true,
                (SELECT COALESCE(MAX(display_order), -1) + 1 FROM profiles WHERE user_id = $1))
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(profile.user_id)
    .bind(&profile.slug)
    .bind(&profile.name)
    .bind(&profile.title)
    .bind(&profile.bio)
    .bind(DEFAULT_AVATAR)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO themes (profile_id, bg_type, bg_value, button_style, button_color, text_color, font)
        VALUES ($1, 'gradient', 'linear-gradient(135deg, #667eea 0%, #764ba2 100%)', 'rounded', '#667eea', '#333333', 'Inter')
        "#,
    )
    .bind(created.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(created)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Public lookup: the profile and its owner must both be active.
pub async fn find_public_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        r#"
        SELECT p.id, p.user_id, p.slug, p.name, p.title, p.bio, p.avatar,
               p.is_active, p.display_order, p.created_at, p.updated_at
        FROM profiles p
        JOIN users u ON u.id = p.user_id
        WHERE p.slug = $1 AND p.is_active = true AND u.is_active = true
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

pub async fn list_for_user(pool: &PgPool, user_id: i32) -> Result<Vec<ProfileWithStats>, sqlx::Error> {
    sqlx::query_as::<_, ProfileWithStats>(
        r#"
        SELECT p.id, p.user_id, p.slug, p.name, p.title, p.bio, p.avatar,
               p.is_active, p.display_order, p.created_at, p.updated_at,
               COUNT(DISTINCT l.id) AS link_count,
               COALESCE(SUM(l.clicks), 0)::BIGINT AS total_clicks
        FROM profiles p
        LEFT JOIN links l ON l.profile_id = p.id AND l.is_active = true
        WHERE p.user_id = $1
        GROUP BY p.id
        ORDER BY p.display_order ASC, p.created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn update(pool: &PgPool, profile: &Profile) -> Result<Profile, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!(
        r#"
        UPDATE profiles SET slug = $1, name = $2, title = $3, bio = $4,
               avatar = $5, is_active = $6, display_order = $7, updated_at = now()
        WHERE id = $8
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(&profile.slug)
    .bind(&profile.name)
    .bind(&profile.title)
    .bind(&profile.bio)
    .bind(&profile.avatar)
    .bind(profile.is_active)
    .bind(profile.display_order)
    .bind(profile.id)
    .fetch_one(pool)
    .await
}

/// Theme, links and categories go with it through `ON DELETE CASCADE`.
pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE LOWER(slug) = LOWER($1))")
        .bind(slug)
        .fetch_one(pool)
        .await
}

/// Owner of a profile, `None` when the profile does not exist.
pub async fn owner_of(pool: &PgPool, profile_id: i32) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM profiles WHERE id = $1")
        .bind(profile_id)
        .fetch_optional(pool)
        .await
}
