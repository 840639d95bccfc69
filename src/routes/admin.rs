//! Admin dashboard: site statistics and user/profile moderation.

use axum::Json;
use serde::{Deserialize, Serialize};

use super::{message, ok, ApiResponse, JsonBody, MessageData, PathParam, QueryParams};
use crate::auth::AuthUser;
use crate::db::{
    self,
    repository::{
        admin::{self, AdminProfile, AdminStats, AdminUser},
        sessions,
    },
};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Option<String>,
}

impl SearchQuery {
    fn term(&self) -> &str {
        self.search.as_deref().map(str::trim).unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateUserRequest {
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateProfileStatusRequest {
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub user: AdminUser,
    pub profiles: Vec<AdminProfile>,
}

/// GET /api/v1/admin/stats
pub async fn get_stats() -> ApiResult<Json<ApiResponse<AdminStats>>> {
    let pool = db::pool()?;
    Ok(ok(admin::stats(&pool).await?))
}

/// GET /api/v1/admin/users?search=
pub async fn list_users(
    QueryParams(query): QueryParams<SearchQuery>,
) -> ApiResult<Json<ApiResponse<Vec<AdminUser>>>> {
    let pool = db::pool()?;
    Ok(ok(admin::list_users(&pool, query.term()).await?))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(PathParam(id): PathParam<i32>) -> ApiResult<Json<ApiResponse<UserDetail>>> {
    let pool = db::pool()?;
    let user = admin::find_user(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    let profiles = admin::profiles_of_user(&pool, id).await?;
    Ok(ok(UserDetail { user, profiles }))
}

/// PUT /api/v1/admin/users/{id}
///
/// Deactivating a user also ends their sessions.
pub async fn update_user(
    admin_user: AuthUser,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<MessageData>>> {
    if payload.is_verified.is_none() && payload.is_active.is_none() && payload.is_admin.is_none() {
        return Err(ApiError::validation("No updates provided"));
    }

    let pool = db::pool()?;
    admin::update_user_flags(
        &pool,
        id,
        payload.is_verified,
        payload.is_active,
        payload.is_admin,
    )
    .await?
    .ok_or(ApiError::NotFound("User"))?;

    if payload.is_active == Some(false) {
        sessions::delete_for_user(&pool, id).await?;
    }

    tracing::info!(
        admin_id = admin_user.user_id,
        user_id = id,
        is_verified = ?payload.is_verified,
        is_active = ?payload.is_active,
        is_admin = ?payload.is_admin,
        "Admin updated user"
    );

    Ok(message("User updated"))
}

/// GET /api/v1/admin/profiles?search=
pub async fn list_profiles(
    QueryParams(query): QueryParams<SearchQuery>,
) -> ApiResult<Json<ApiResponse<Vec<AdminProfile>>>> {
    let pool = db::pool()?;
    Ok(ok(admin::list_profiles(&pool, query.term()).await?))
}

/// PUT /api/v1/admin/profiles/{id}
pub async fn update_profile(
    admin_user: AuthUser,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateProfileStatusRequest>,
) -> ApiResult<Json<ApiResponse<MessageData>>> {
    let is_active = payload
        .is_active
        .ok_or_else(|| ApiError::validation("No updates provided"))?;

    let pool = db::pool()?;
    if !admin::set_profile_active(&pool, id, is_active).await? {
        return Err(ApiError::NotFound("Profile"));
    }

    tracing::info!(
        admin_id = admin_user.user_id,
        profile_id = id,
        is_active,
        "Admin updated profile"
    );

    Ok(message("Profile updated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{require_admin, require_auth};
    use crate::routes::test_support::{bearer, send};
    use axum::http::StatusCode;
    use axum::routing::{get, put};
    use axum::{middleware, Router};
    use serde_json::json;

    fn app() -> Router {
        Router::new()
            .route("/admin/stats", get(get_stats))
            .route("/admin/users", get(list_users))
            .route("/admin/users/{id}", get(get_user).put(update_user))
            .route("/admin/profiles", get(list_profiles))
            .route("/admin/profiles/{id}", put(update_profile))
            .route_layer(middleware::from_fn(require_admin))
            .route_layer(middleware::from_fn(require_auth))
    }

    #[test]
    fn test_search_term_is_trimmed() {
        let query = SearchQuery {
            search: Some("  bob ".into()),
        };
        assert_eq!(query.term(), "bob");
        assert_eq!(SearchQuery::default().term(), "");
    }

    #[tokio::test]
    async fn test_stats_require_token() {
        let (status, _) = send(app(), "GET", "/admin/stats", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_stats_forbidden_for_regular_user() {
        let (status, body) = send(app(), "GET", "/admin/stats", Some(bearer(9, false)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Admin access required");
    }

    #[tokio::test]
    async fn test_stats_for_admin_reach_handler() {
        let (status, _) = send(app(), "GET", "/admin/stats", Some(bearer(1, true)), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_update_user_without_fields_is_bad_request() {
        let (status, body) = send(
            app(),
            "PUT",
            "/admin/users/2",
            Some(bearer(1, true)),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No updates provided");
    }

    #[tokio::test]
    async fn test_update_profile_without_flag_is_bad_request() {
        let (status, _) = send(
            app(),
            "PUT",
            "/admin/profiles/2",
            Some(bearer(1, true)),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
