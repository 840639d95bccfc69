//! Link categories of a profile.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{
    created,
    links::distinct_ids,
    message, ok,
    profiles::{check_owner, ensure_profile_owner},
    validation, ApiResponse, JsonBody, MessageData, PathParam,
};
use crate::auth::AuthUser;
use crate::db::{
    self,
    models::{Category, NewCategory, PositionUpdate},
    repository::categories,
};
use crate::error::{ApiError, ApiResult};

const DEFAULT_ICON: &str = "bi-folder";
const DEFAULT_COLOR: &str = "#667eea";
const ICON_MAX: usize = 50;

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub is_expanded: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReorderCategoriesRequest {
    pub categories: Vec<PositionUpdate>,
}

async fn ensure_category_owner(pool: &PgPool, id: i32, auth: &AuthUser) -> ApiResult<()> {
    check_owner(categories::owner_of(pool, id).await?, auth, "Category")
}

/// GET /api/v1/profiles/{profile_id}/categories
pub async fn list_categories(
    auth: AuthUser,
    PathParam(profile_id): PathParam<i32>,
) -> ApiResult<Json<ApiResponse<Vec<Category>>>> {
    let pool = db::pool()?;
    ensure_profile_owner(&pool, profile_id, &auth).await?;
    Ok(ok(categories::list_for_profile(&pool, profile_id).await?))
}

/// POST /api/v1/profiles/{profile_id}/categories
pub async fn create_category(
    auth: AuthUser,
    PathParam(profile_id): PathParam<i32>,
    JsonBody(payload): JsonBody<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Category>>)> {
    let name = validation::required("Name", &payload.name, validation::NAME_MAX)?;
    let icon = match validation::optional_text(payload.icon) {
        Some(raw) => validation::required("Icon", &raw, ICON_MAX)?,
        None => DEFAULT_ICON.to_string(),
    };
    let color = match validation::optional_text(payload.color) {
        Some(raw) => validation::color(&raw)?,
        None => DEFAULT_COLOR.to_string(),
    };

    let pool = db::pool()?;
    ensure_profile_owner(&pool, profile_id, &auth).await?;

    let category = categories::create(
        &pool,
        &NewCategory {
            profile_id,
            name,
            icon,
            color,
            position: payload.position.filter(|p| *p > 0),
        },
    )
    .await?;

    Ok(created(category))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    auth: AuthUser,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateCategoryRequest>,
) -> ApiResult<Json<ApiResponse<Category>>> {
    let name = payload
        .name
        .as_deref()
        .map(|n| validation::required("Name", n, validation::NAME_MAX))
        .transpose()?;
    let icon = payload
        .icon
        .as_deref()
        .map(|i| validation::required("Icon", i, ICON_MAX))
        .transpose()?;
    let color = payload.color.as_deref().map(validation::color).transpose()?;

    let pool = db::pool()?;
    ensure_category_owner(&pool, id, &auth).await?;
    let mut category = categories::find_by_id(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;

    if let Some(name) = name {
        category.name = name;
    }
    if let Some(icon) = icon {
        category.icon = icon;
    }
    if let Some(color) = color {
        category.color = color;
    }
    if let Some(position) = payload.position {
        category.position = position;
    }
    if let Some(is_expanded) = payload.is_expanded {
        category.is_expanded = is_expanded;
    }

    Ok(ok(categories::update(&pool, &category).await?))
}

/// DELETE /api/v1/categories/{id}
///
/// Its links stay on the profile, uncategorized.
pub async fn delete_category(
    auth: AuthUser,
    PathParam(id): PathParam<i32>,
) -> ApiResult<Json<ApiResponse<MessageData>>> {
    let pool = db::pool()?;
    ensure_category_owner(&pool, id, &auth).await?;

    if !categories::delete(&pool, id).await? {
        return Err(ApiError::NotFound("Category"));
    }

    Ok(message("Category deleted"))
}

/// PUT /api/v1/categories/reorder
pub async fn reorder_categories(
    auth: AuthUser,
    JsonBody(payload): JsonBody<ReorderCategoriesRequest>,
) -> ApiResult<Json<ApiResponse<MessageData>>> {
    let ids = distinct_ids(&payload.categories, "categories")?;

    let pool = db::pool()?;
    let owned = categories::count_owned(&pool, &ids, auth.user_id).await?;
    if owned != ids.len() as i64 {
        return Err(ApiError::forbidden());
    }

    categories::reorder(&pool, &payload.categories).await?;

    Ok(message("Categories reordered"))
}
