//! Links of a profile, bulk reordering, and owner-only edits.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashSet;

use super::{
    created, message, nullable, ok,
    profiles::{check_owner, ensure_profile_owner},
    validation, ApiResponse, JsonBody, MessageData, PathParam,
};
use crate::auth::AuthUser;
use crate::db::{
    self,
    models::{Link, NewLink, PositionUpdate},
    repository::{categories, links},
};
use crate::error::{ApiError, ApiResult};

const ICON_MAX: usize = 50;

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateLinkRequest {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLinkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// `null` moves the link out of its category.
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: Option<Option<i32>>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReorderLinksRequest {
    pub links: Vec<PositionUpdate>,
}

/// 404 when the link is missing, 403 when another user owns it.
async fn ensure_link_owner(pool: &PgPool, id: i32, auth: &AuthUser) -> ApiResult<()> {
    check_owner(links::owner_of(pool, id).await?, auth, "Link")
}

async fn ensure_category_in_profile(
    pool: &PgPool,
    category_id: i32,
    profile_id: i32,
) -> ApiResult<()> {
    if !categories::belongs_to_profile(pool, category_id, profile_id).await? {
        return Err(ApiError::validation(
            "Category does not belong to this profile",
        ));
    }
    Ok(())
}

fn icon(raw: &str) -> ApiResult<String> {
    validation::required("Icon", raw, ICON_MAX)
}

/// Ids of a reorder request; must be non-empty and free of duplicates.
pub(crate) fn distinct_ids(updates: &[PositionUpdate], what: &str) -> ApiResult<Vec<i32>> {
    if updates.is_empty() {
        return Err(ApiError::validation(format!("No {what} provided")));
    }
    let mut seen = HashSet::new();
    for update in updates {
        if !seen.insert(update.id) {
            return Err(ApiError::validation(format!(
                "Duplicate id {} in {what}",
                update.id
            )));
        }
    }
    Ok(updates.iter().map(|u| u.id).collect())
}

/// GET /api/v1/profiles/{profile_id}/links
pub async fn list_links(
    auth: AuthUser,
    PathParam(profile_id): PathParam<i32>,
) -> ApiResult<Json<ApiResponse<Vec<Link>>>> {
    let pool = db::pool()?;
    ensure_profile_owner(&pool, profile_id, &auth).await?;
    Ok(ok(links::list_for_profile(&pool, profile_id, false).await?))
}

/// POST /api/v1/profiles/{profile_id}/links
///
/// A missing or non-positive `position` appends the link at the end.
pub async fn create_link(
    auth: AuthUser,
    PathParam(profile_id): PathParam<i32>,
    JsonBody(payload): JsonBody<CreateLinkRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Link>>)> {
    let title = validation::required("Title", &payload.title, validation::NAME_MAX)?;
    let url = validation::link_url(&payload.url)?;
    let icon = match validation::optional_text(payload.icon) {
        Some(raw) => icon(&raw)?,
        None => links::DEFAULT_ICON.to_string(),
    };

    let pool = db::pool()?;
    ensure_profile_owner(&pool, profile_id, &auth).await?;
    if let Some(category_id) = payload.category_id {
        ensure_category_in_profile(&pool, category_id, profile_id).await?;
    }

    let link = links::create(
        &pool,
        &NewLink {
            profile_id,
            category_id: payload.category_id,
            title,
            url,
            icon,
            position: payload.position.filter(|p| *p > 0),
        },
    )
    .await?;

    Ok(created(link))
}

/// PUT /api/v1/links/{id}
pub async fn update_link(
    auth: AuthUser,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateLinkRequest>,
) -> ApiResult<Json<ApiResponse<Link>>> {
    let title = payload
        .title
        .as_deref()
        .map(|t| validation::required("Title", t, validation::NAME_MAX))
        .transpose()?;
    let url = payload.url.as_deref().map(validation::link_url).transpose()?;
    let new_icon = payload.icon.as_deref().map(icon).transpose()?;

    let pool = db::pool()?;
    ensure_link_owner(&pool, id, &auth).await?;
    let mut link = links::find_by_id(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("Link"))?;

    if let Some(category_id) = payload.category_id {
        if let Some(category_id) = category_id {
            ensure_category_in_profile(&pool, category_id, link.profile_id).await?;
        }
        link.category_id = category_id;
    }
    if let Some(title) = title {
        link.title = title;
    }
    if let Some(url) = url {
        link.url = url;
    }
    if let Some(icon) = new_icon {
        link.icon = icon;
    }
    if let Some(position) = payload.position {
        link.position = position;
    }
    if let Some(is_active) = payload.is_active {
        link.is_active = is_active;
    }

    Ok(ok(links::update(&pool, &link).await?))
}

/// DELETE /api/v1/links/{id}
pub async fn delete_link(
    auth: AuthUser,
    PathParam(id): PathParam<i32>,
) -> ApiResult<Json<ApiResponse<MessageData>>> {
    let pool = db::pool()?;
    ensure_link_owner(&pool, id, &auth).await?;

    if !links::delete(&pool, id).await? {
        return Err(ApiError::NotFound("Link"));
    }

    Ok(message("Link deleted"))
}

/// PUT /api/v1/links/reorder
///
/// All positions are written in one transaction, and only when every id
/// belongs to the caller.
pub async fn reorder_links(
    auth: AuthUser,
    JsonBody(payload): JsonBody<ReorderLinksRequest>,
) -> ApiResult<Json<ApiResponse<MessageData>>> {
    let ids = distinct_ids(&payload.links, "links")?;

    let pool = db::pool()?;
    let owned = links::count_owned(&pool, &ids, auth.user_id).await?;
    if owned != ids.len() as i64 {
        return Err(ApiError::forbidden());
    }

    links::reorder(&pool, &payload.links).await?;

    Ok(message("Links reordered"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::require_auth;
    use crate::routes::test_support::{bearer, send};
    use axum::routing::{get, put};
    use axum::{middleware, Router};
    use serde_json::json;

    fn app() -> Router {
        Router::new()
            .route(
                "/profiles/{profile_id}/links",
                get(list_links).post(create_link),
            )
            .route("/links/reorder", put(reorder_links))
            .route("/links/{id}", put(update_link).delete(delete_link))
            .route_layer(middleware::from_fn(require_auth))
    }

    #[test]
    fn test_distinct_ids() {
        let updates = [
            PositionUpdate { id: 1, position: 2 },
            PositionUpdate { id: 2, position: 1 },
        ];
        assert_eq!(distinct_ids(&updates, "links").unwrap(), vec![1, 2]);
        assert!(distinct_ids(&[], "links").is_err());

        let duplicated = [
            PositionUpdate { id: 1, position: 2 },
            PositionUpdate { id: 1, position: 1 },
        ];
        assert!(distinct_ids(&duplicated, "links").is_err());
    }

    #[tokio::test]
    async fn test_create_link_rejects_javascript_url() {
        let (status, body) = send(
            app(),
            "POST",
            "/profiles/1/links",
            Some(bearer(1, false)),
            Some(json!({"title": "x", "url": "javascript:alert(1)"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_create_link_requires_title() {
        let (status, _) = send(
            app(),
            "POST",
            "/profiles/1/links",
            Some(bearer(1, false)),
            Some(json!({"title": "", "url": "https://example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reorder_route_is_not_shadowed_by_id_route() {
        let (status, body) = send(
            app(),
            "PUT",
            "/links/reorder",
            Some(bearer(1, false)),
            Some(json!({"links": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No links provided");
    }

    #[tokio::test]
    async fn test_reorder_without_database_is_unavailable() {
        let (status, _) = send(
            app(),
            "PUT",
            "/links/reorder",
            Some(bearer(1, false)),
            Some(json!({"links": [{"id": 1, "position": 1}]})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_links_require_token() {
        let (status, _) = send(app(), "DELETE", "/links/5", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
