use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DayStats {
    pub date: NaiveDate,
    pub clicks: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LinkStats {
    pub link_id: i32,
    pub title: String,
    pub clicks: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CountryStats {
    pub country: String,
    pub clicks: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReferrerStats {
    pub referrer: String,
    pub clicks: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileAnalytics {
    pub total_clicks: i64,
    pub clicks_by_day: Vec<DayStats>,
    pub clicks_by_link: Vec<LinkStats>,
    pub clicks_by_country: Vec<CountryStats>,
    pub top_referrers: Vec<ReferrerStats>,
}

/// Lifetime counter total, plus per-day, per-country and per-referrer
/// breakdowns of the click log since `since`.
pub async fn for_profile(
    pool: &PgPool,
    profile_id: i32,
    since: DateTime<Utc>,
) -> Result<ProfileAnalytics, sqlx::Error> {
    let total_clicks: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(clicks), 0)::BIGINT FROM links WHERE profile_id = $1",
    )
    .bind(profile_id)
    .fetch_one(pool)
    .await?;

    let clicks_by_day = sqlx::query_as::<_, DayStats>(
        r#"
        SELECT DATE(c.clicked_at) AS date, COUNT(*) AS clicks
        FROM clicks c
        JOIN links l ON l.id = c.link_id
        WHERE l.profile_id = $1 AND c.clicked_at >= $2
        GROUP BY DATE(c.clicked_at)
        ORDER BY date ASC
        "#,
    )
    .bind(profile_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    let clicks_by_link = sqlx::query_as::<_, LinkStats>(
        r#"
        SELECT id AS link_id, title, clicks::BIGINT AS clicks
        FROM links
        WHERE profile_id = $1 AND clicks > 0
        ORDER BY clicks DESC
        LIMIT 10
        "#,
    )
    .bind(profile_id)
    .fetch_all(pool)
    .await?;

    let clicks_by_country = sqlx::query_as::<_, CountryStats>(
        r#"
        SELECT COALESCE(c.country, 'Unknown') AS country, COUNT(*) AS clicks
        FROM clicks c
        JOIN links l ON l.id = c.link_id
        WHERE l.profile_id = $1 AND c.clicked_at >= $2
        GROUP BY 1
        ORDER BY clicks DESC
        LIMIT 10
        "#,
    )
    .bind(profile_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    let top_referrers = sqlx::query_as::<_, ReferrerStats>(
        r#"
        SELECT COALESCE(c.referrer, 'Direct') AS referrer, COUNT(*) AS clicks
        FROM clicks c
        JOIN links l ON l.id = c.link_id
        WHERE l.profile_id = $1 AND c.clicked_at >= $2
        GROUP BY 1
        ORDER BY clicks DESC
        LIMIT 10
        "#,
    )
    .bind(profile_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(ProfileAnalytics {
        total_clicks,
        clicks_by_day,
        clicks_by_link,
        clicks_by_country,
        top_referrers,
    })
}
