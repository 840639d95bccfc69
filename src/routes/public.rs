//! Unauthenticated endpoints: the public profile page and click tracking.

use axum::{body::Bytes, Json};
use serde::{Deserialize, Serialize};

use super::{ok, ApiResponse, ClientMeta, PathParam};
use crate::db::{
    self,
    models::{Category, Link, NewClick, Profile, Theme},
    repository::{categories, links, profiles, themes, users},
};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub profile: Profile,
    pub theme: Option<Theme>,
    pub categories: Vec<Category>,
    pub links: Vec<Link>,
    /// Whether the owner's account is verified.
    pub is_verified: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ClickRequest {
    #[serde(default)]
    referrer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClickResponse {
    pub url: String,
}

/// GET /api/v1/p/{slug}
pub async fn get_public_profile(
    PathParam(slug): PathParam<String>,
) -> ApiResult<Json<ApiResponse<PublicProfile>>> {
    let pool = db::pool()?;

    let profile = profiles::find_public_by_slug(&pool, slug.trim())
        .await?
        .ok_or(ApiError::NotFound("Profile"))?;

    let theme = themes::find_by_profile(&pool, profile.id).await?;
    let categories = categories::list_for_profile(&pool, profile.id).await?;
    let links = links::list_for_profile(&pool, profile.id, true).await?;
    let is_verified = users::find_active_by_id(&pool, profile.user_id)
        .await?
        .map(|owner| owner.is_verified)
        .unwrap_or(false);

    Ok(ok(PublicProfile {
        profile,
        theme,
        categories,
        links,
        is_verified,
    }))
}

/// POST /api/v1/click/{id}
///
/// The referrer comes from the JSON body when given, else from the
/// `Referer` header. Any body, including none, is accepted.
pub async fn track_click(
    PathParam(id): PathParam<i32>,
    meta: ClientMeta,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<ClickResponse>>> {
    let payload: ClickRequest = serde_json::from_slice(&body).unwrap_or_default();

    let pool = db::pool()?;

    let click = NewClick {
        link_id: id,
        referrer: payload
            .referrer
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .or(meta.referer),
        ip: meta.ip,
        user_agent: meta.user_agent,
    };

    let url = links::record_click(&pool, &click)
        .await?
        .ok_or(ApiError::NotFound("Link"))?;

    Ok(ok(ClickResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::send;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;

    fn app() -> Router {
        Router::new()
            .route("/p/{slug}", get(get_public_profile))
            .route("/click/{id}", post(track_click))
    }

    #[tokio::test]
    async fn test_public_profile_needs_no_token() {
        let (status, _) = send(app(), "GET", "/p/alice", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_click_accepts_empty_body() {
        let (status, _) = send(app(), "POST", "/click/1", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_click_with_bad_id_is_json_validation_error() {
        let (status, body) = send(app(), "POST", "/click/abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid path parameter"));
    }
}
