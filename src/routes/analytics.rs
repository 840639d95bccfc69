//! Click analytics for one profile.

use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;

use super::{ok, profiles::ensure_profile_owner, ApiResponse, PathParam, QueryParams};
use crate::auth::AuthUser;
use crate::db::{
    self,
    repository::analytics::{self, ProfileAnalytics},
};
use crate::error::ApiResult;

pub const DEFAULT_DAYS: i64 = 30;
pub const MAX_DAYS: i64 = 365;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<i64>,
}

impl AnalyticsQuery {
    /// Window length in days, clamped to `1..=365`.
    pub fn days(&self) -> i64 {
        self.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS)
    }
}

/// GET /api/v1/profiles/{profile_id}/analytics?days=N
pub async fn get_analytics(
    auth: AuthUser,
    PathParam(profile_id): PathParam<i32>,
    QueryParams(query): QueryParams<AnalyticsQuery>,
) -> ApiResult<Json<ApiResponse<ProfileAnalytics>>> {
    let pool = db::pool()?;
    ensure_profile_owner(&pool, profile_id, &auth).await?;

    let since = Utc::now() - Duration::days(query.days());
    Ok(ok(analytics::for_profile(&pool, profile_id, since).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_app;
    use crate::routes::test_support::{bearer, send};
    use axum::http::StatusCode;

    #[test]
    fn test_days_default_and_clamp() {
        assert_eq!(AnalyticsQuery::default().days(), 30);
        assert_eq!(AnalyticsQuery { days: Some(7) }.days(), 7);
        assert_eq!(AnalyticsQuery { days: Some(0) }.days(), 1);
        assert_eq!(AnalyticsQuery { days: Some(-5) }.days(), 1);
        assert_eq!(AnalyticsQuery { days: Some(10_000) }.days(), 365);
    }

    #[tokio::test]
    async fn test_unparsable_days_is_json_validation_error() {
        let (status, body) = send(
            create_app(),
            "GET",
            "/api/v1/profiles/1/analytics?days=abc",
            Some(bearer(1, false)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid query string"));
    }
}
