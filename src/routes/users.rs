//! The signed-in user's own account.

use axum::Json;
use serde::{Deserialize, Serialize};

use super::{message, ok, validation, ApiResponse, JsonBody, MessageData};
use crate::auth::{self, AuthUser};
use crate::db::{
    self,
    models::{User, UserPublic},
    repository::{sessions, users},
};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateMeRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

async fn current_user(pool: &sqlx::PgPool, auth: &AuthUser) -> ApiResult<User> {
    users::find_active_by_id(pool, auth.user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))
}

/// GET /api/v1/me
pub async fn get_me(auth: AuthUser) -> ApiResult<Json<ApiResponse<UserPublic>>> {
    let pool = db::pool()?;
    let user = current_user(&pool, &auth).await?;
    Ok(ok(UserPublic::from(&user)))
}

/// PUT /api/v1/me
pub async fn update_me(
    auth: AuthUser,
    JsonBody(payload): JsonBody<UpdateMeRequest>,
) -> ApiResult<Json<ApiResponse<UserPublic>>> {
    let username = payload
        .username
        .as_deref()
        .map(validation::username)
        .transpose()?;
    let email = payload.email.as_deref().map(validation::email).transpose()?;

    let pool = db::pool()?;
    let mut user = current_user(&pool, &auth).await?;

    if let Some(username) = username.filter(|u| *u != user.username) {
        if users::username_exists(&pool, &username).await? {
            return Err(ApiError::conflict("Username already taken"));
        }
        user.username = username;
    }

    if let Some(email) = email.filter(|e| !e.eq_ignore_ascii_case(&user.email)) {
        if users::email_exists(&pool, &email).await? {
            return Err(ApiError::conflict("Email already registered"));
        }
        user.email = email;
    }

    let updated = users::update(&pool, &user).await?;
    Ok(ok(UserPublic::from(&updated)))
}

/// PUT /api/v1/me/password
///
/// Every refresh-token session of the user is revoked afterwards.
pub async fn change_password(
    auth: AuthUser,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<MessageData>>> {
    if payload.current_password.is_empty() {
        return Err(ApiError::validation("Current password is required"));
    }
    validation::password(&payload.new_password)?;

    let pool = db::pool()?;
    let user = current_user(&pool, &auth).await?;

    if !auth::verify_password(payload.current_password, user.password_hash.clone()).await? {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let password_hash = auth::hash_password(payload.new_password).await?;
    users::update_password(&pool, user.id, &password_hash).await?;
    let revoked = sessions::delete_for_user(&pool, user.id).await?;

    tracing::info!(user_id = user.id, revoked, "Password changed");

    Ok(message("Password updated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::require_auth;
    use crate::routes::test_support::{bearer, send};
    use axum::http::StatusCode;
    use axum::routing::{get, put};
    use axum::{middleware, Router};
    use serde_json::json;

    fn app() -> Router {
        Router::new()
            .route("/me", get(get_me).put(update_me))
            .route("/me/password", put(change_password))
            .route_layer(middleware::from_fn(require_auth))
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let (status, _) = send(app(), "GET", "/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_without_database_is_unavailable() {
        let (status, _) = send(app(), "GET", "/me", Some(bearer(1, false)), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_update_me_validates_before_lookup() {
        let (status, body) = send(
            app(),
            "PUT",
            "/me",
            Some(bearer(1, false)),
            Some(json!({"email": "broken"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid email format");
    }

    #[tokio::test]
    async fn test_change_password_rejects_short_password() {
        let (status, _) = send(
            app(),
            "PUT",
            "/me/password",
            Some(bearer(1, false)),
            Some(json!({"current_password": "oldpassword", "new_password": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
