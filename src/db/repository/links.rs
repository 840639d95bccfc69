use sqlx::PgPool;

use crate::db::models::{Link, NewClick, NewLink, PositionUpdate};

const LINK_COLUMNS: &str =
    "id, profile_id, category_id, title, url, icon, position, clicks, is_active, created_at, updated_at";

pub const DEFAULT_ICON: &str = "bi-link-45deg";

pub async fn create(pool: &PgPool, link: &NewLink) -> Result<Link, sqlx::Error> {
    sqlx::query_as::<_, Link>(&format!(
        r#"
        INSERT INTO links (profile_id, category_id, title, url, icon, position, clicks, is_active)
        VALUES ($1, $2, $3, $4, $5,
                COALESCE($6, (SELECT COALESCE(MAX(position), 0) + 1 FROM links WHERE profile_id = $1)),
                0, true)
        RETURNING {LINK_COLUMNS}
        "#
    ))
    .bind(link.profile_id)
    .bind(link.category_id)
    .bind(&link.title)
    .bind(&link.url)
    .bind(&link.icon)
    .bind(link.position)
    .fetch_one(pool)
    .await
}

/// Links of a profile in display order. `active_only` is used by the public page.
pub async fn list_for_profile(
    pool: &PgPool,
    profile_id: i32,
    active_only: bool,
) -> Result<Vec<Link>, sqlx::Error> {
    sqlx::query_as::<_, Link>(&format!(
        r#"
        SELECT {LINK_COLUMNS} FROM links
        WHERE profile_id = $1 AND ($2 = false OR is_active = true)
        ORDER BY position ASC, id ASC
        "#
    ))
    .bind(profile_id)
    .bind(active_only)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Link>, sqlx::Error> {
    sqlx::query_as::<_, Link>(&format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn owner_of(pool: &PgPool, id: i32) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT p.user_id FROM links l JOIN profiles p ON p.id = l.profile_id WHERE l.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn update(pool: &PgPool, link: &Link) -> Result<Link, sqlx::Error> {
    sqlx::query_as::<_, Link>(&format!(
        r#"
        UPDATE links SET category_id = $1, title = $2, url = $3, icon = $4,
               position = $5, is_active = $6, updated_at = now()
        WHERE id = $7
        RETURNING {LINK_COLUMNS}
        "#
    ))
    .bind(link.category_id)
    .bind(&link.title)
    .bind(&link.url)
    .bind(&link.icon)
    .bind(link.position)
    .bind(link.is_active)
    .bind(link.id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM links WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_owned(pool: &PgPool, ids: &[i32], user_id: i32) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT l.id) FROM links l
        JOIN profiles p ON p.id = l.profile_id
        WHERE l.id = ANY($1) AND p.user_id = $2
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
        sqlx::query("UPDATE links SET position = $1, updated_at = now() WHERE id = $2")
            .bind(update.position)
            .bind(update.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await
}

/// Bump the counter of an active link on an active profile and log the
/// click, both in one transaction. Returns the target URL, or `None` when
/// the link is not publicly reachable.
pub async fn record_click(pool: &PgPool, click: &NewClick) -> Result<Option<String>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let url: Option<String> = sqlx::query_scalar(
        r#"
        UPDATE links l SET clicks = l.clicks + 1
        FROM profiles p
        WHERE l.id = $1 AND l.is_active = true AND p.id = l.profile_id AND p.is_active = true
        RETURNING l.url
        "#,
    )
    .bind(click.link_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(url) = url else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query("INSERT INTO clicks (link_id, ip, user_agent, referrer) VALUES ($1, $2, $3, $4)")
        .bind(click.link_id)
        .bind(&click.ip)
        .bind(&click.user_agent)
        .bind(&click.referrer)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Some(url))
}
