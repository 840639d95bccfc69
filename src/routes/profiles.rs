//! Profile CRUD for the signed-in user.

use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{created, message, ok, validation, ApiResponse, JsonBody, MessageData, PathParam};
use crate::auth::AuthUser;
use crate::db::{
    self,
    models::{NewProfile, Profile, ProfileWithStats},
    repository::profiles,
};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateProfileRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// 404 when there is no owner, i.e. no such row; 403 when it is someone else.
pub(crate) fn check_owner(
    owner: Option<i32>,
    auth: &AuthUser,
    entity: &'static str,
) -> ApiResult<()> {
    match owner {
        None => Err(ApiError::NotFound(entity)),
        Some(owner) if owner != auth.user_id => Err(ApiError::forbidden()),
        Some(_) => Ok(()),
    }
}

pub(crate) async fn ensure_profile_owner(
    pool: &PgPool,
    profile_id: i32,
    auth: &AuthUser,
) -> ApiResult<()> {
    check_owner(profiles::owner_of(pool, profile_id).await?, auth, "Profile")
}

async fn owned_profile(pool: &PgPool, id: i32, auth: &AuthUser) -> ApiResult<Profile> {
    let profile = profiles::find_by_id(pool, id).await?;
    check_owner(profile.as_ref().map(|p| p.user_id), auth, "Profile")?;
    profile.ok_or(ApiError::NotFound("Profile"))
}

/// GET /api/v1/profiles
pub async fn list_profiles(auth: AuthUser) -> ApiResult<Json<ApiResponse<Vec<ProfileWithStats>>>> {
    let pool = db::pool()?;
    Ok(ok(profiles::list_for_user(&pool, auth.user_id).await?))
}

/// POST /api/v1/profiles
pub async fn create_profile(
    auth: AuthUser,
    JsonBody(payload): JsonBody<CreateProfileRequest>,
) -> ApiResult<(axum::http::StatusCode, Json<ApiResponse<Profile>>)> {
    let slug = validation::slug(&payload.slug)?;
    let name = validation::required("Name", &payload.name, validation::NAME_MAX)?;

    let pool = db::pool()?;
    if profiles::slug_exists(&pool, &slug).await? {
        return Err(ApiError::conflict("Slug already taken"));
    }

    let profile = profiles::create(
        &pool,
        &NewProfile {
            user_id: auth.user_id,
            slug,
            name,
            title: validation::optional_text(payload.title),
            bio: validation::optional_text(payload.bio),
        },
    )
    .await?;

    tracing::info!(user_id = auth.user_id, profile_id = profile.id, "Profile created");

    Ok(created(profile))
}

/// GET /api/v1/profiles/{id}
pub async fn get_profile(
    auth: AuthUser,
    PathParam(id): PathParam<i32>,
) -> ApiResult<Json<ApiResponse<Profile>>> {
    let pool = db::pool()?;
    Ok(ok(owned_profile(&pool, id, &auth).await?))
}

/// PUT /api/v1/profiles/{id}
///
/// Absent fields keep their value; an empty `title` or `bio` clears it.
pub async fn update_profile(
    auth: AuthUser,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<Profile>>> {
    let slug = payload.slug.as_deref().map(validation::slug).transpose()?;
    let name = payload
        .name
        .as_deref()
        .map(|n| validation::required("Name", n, validation::NAME_MAX))
        .transpose()?;

    let pool = db::pool()?;
    let mut profile = owned_profile(&pool, id, &auth).await?;

    if let Some(slug) = slug.filter(|s| *s != profile.slug) {
        if profiles::slug_exists(&pool, &slug).await? {
            return Err(ApiError::conflict("Slug already taken"));
        }
        profile.slug = slug;
    }
    if let Some(name) = name {
        profile.name = name;
    }
    if payload.title.is_some() {
        profile.title = validation::optional_text(payload.title);
    }
    if payload.bio.is_some() {
        profile.bio = validation::optional_text(payload.bio);
    }
    if let Some(avatar) = validation::optional_text(payload.avatar) {
        profile.avatar = avatar;
    }
    if let Some(is_active) = payload.is_active {
        profile.is_active = is_active;
    }
    if let Some(display_order) = payload.display_order {
        profile.display_order = display_order;
    }

    Ok(ok(profiles::update(&pool, &profile).await?))
}

/// DELETE /api/v1/profiles/{id}
pub async fn delete_profile(
    auth: AuthUser,
    PathParam(id): PathParam<i32>,
) -> ApiResult<Json<ApiResponse<MessageData>>> {
    let pool = db::pool()?;
    ensure_profile_owner(&pool, id, &auth).await?;

    if !profiles::delete(&pool, id).await? {
        return Err(ApiError::NotFound("Profile"));
    }

    tracing::info!(user_id = auth.user_id, profile_id = id, "Profile deleted");

    Ok(message("Profile deleted"))
}
