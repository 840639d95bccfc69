use sqlx::PgPool;

use crate::db::models::{Category, NewCategory, PositionUpdate};

const CATEGORY_COLUMNS: &str =
    "id, profile_id, name, icon, color, position, is_expanded, created_at";

pub async fn create(pool: &PgPool, category: &NewCategory) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        r#"
        INSERT INTO categories (profile_id, name, icon, color, position, is_expanded)
        VALUES ($1, $2, $3, $4,
                COALESCE($5, (SELECT COALESCE(MAX(position), 0) + 1 FROM categories WHERE profile_id = $1)),
                true)
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(category.profile_id)
    .bind(&category.name)
    .bind(&category.icon)
    .bind(&category.color)
    .bind(category.position)
    .fetch_one(pool)
    .await
}

pub async fn list_for_profile(pool: &PgPool, profile_id: i32) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE profile_id = $1 ORDER BY position ASC, id ASC"
    ))
    .bind(profile_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Owning user of a category, via its profile.
pub async fn owner_of(pool: &PgPool, id: i32) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT p.user_id FROM categories c JOIN profiles p ON p.id = c.profile_id WHERE c.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn belongs_to_profile(
    pool: &PgPool,
    id: i32,
    profile_id: i32,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND profile_id = $2)")
        .bind(id)
        .bind(profile_id)
        .fetch_one(pool)
        .await
}

pub async fn update(pool: &PgPool, category: &Category) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        r#"
        UPDATE categories SET name = $1, icon = $2, color = $3, position = $4, is_expanded = $5
        WHERE id = $6
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(&category.name)
    .bind(&category.icon)
    .bind(&category.color)
    .bind(category.position)
    .bind(category.is_expanded)
    .bind(category.id)
    .fetch_one(pool)
    .await
}

/// Links in the category keep existing with `category_id` set to NULL.
pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Number of distinct ids among `ids` that belong to profiles of `user_id`.
pub async fn count_owned(pool: &PgPool, ids: &[i32], user_id: i32) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT c.id) FROM categories c
        JOIN profiles p ON p.id = c.profile_id
        WHERE c.id = ANY($1) AND p.user_id = $2
        "#,
    )
    .bind(ids)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn reorder(pool: &PgPool, updates: &[PositionUpdate]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for update in updates {
        sqlx::query("UPDATE categories SET position = $1 WHERE id = $2")
            .bind(update.position)
            .bind(update.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await
}
