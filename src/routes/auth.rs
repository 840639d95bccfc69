//! Registration, login and token endpoints under `/api/v1/auth`.

use axum::{body::Bytes, http::StatusCode, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{created, message, ok, validation, ApiResponse, ClientMeta, JsonBody, MessageData};
use crate::auth::{
    self, create_access_token, generate_refresh_token, hash_refresh_token, otp::OTP_STORE,
};
use crate::config::CONFIG;
use crate::db::{
    self,
    models::{NewProfile, NewSession, NewUser, User, UserPublic},
    repository::{profiles, sessions, users},
};
use crate::error::{ApiError, ApiResult};
use crate::mail;

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct LogoutRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SendOtpRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CompleteRegistrationRequest {
    pub email: String,
    pub password: String,
    pub otp: String,
    pub username: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserPublic,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OtpSentResponse {
    pub message: String,
    pub expires_in: u64,
}

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

/// Access token plus a freshly persisted refresh-token session.
async fn issue_tokens(pool: &PgPool, user: &User, meta: &ClientMeta) -> ApiResult<AuthResponse> {
    let access_token = create_access_token(user)
        .map_err(|e| ApiError::internal(format!("Failed to create access token: {e}")))?;

    let refresh_token = generate_refresh_token();
    sessions::create(
        pool,
        &NewSession {
            user_id: user.id,
            refresh_token_hash: hash_refresh_token(&refresh_token),
            ip: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
            expires_at: Utc::now() + Duration::hours(CONFIG.jwt.refresh_expiry_hours),
        },
    )
    .await?;

    Ok(AuthResponse {
        user: UserPublic::from(user),
        access_token,
        refresh_token,
        expires_in: CONFIG.access_token_ttl_secs(),
    })
}

async fn ensure_identity_free(pool: &PgPool, email: &str, username: &str) -> ApiResult<()> {
    if users::email_exists(pool, email).await? {
        return Err(ApiError::conflict("Email already registered"));
    }
    if users::username_exists(pool, username).await? {
        return Err(ApiError::conflict("Username already taken"));
    }
    Ok(())
}

/// POST /api/v1/auth/register
///
/// Creates an unverified account and a default profile whose slug is the
/// username. A failed profile insert does not fail the registration.
pub async fn register(
    meta: ClientMeta,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> ApiResult<Created<AuthResponse>> {
    let username = validation::username(&payload.username)?;
    let email = validation::email(&payload.email)?;
    validation::password(&payload.password)?;

    let pool = db::pool()?;
    ensure_identity_free(&pool, &email, &username).await?;

    let password_hash = auth::hash_password(payload.password).await?;
    let user = users::create(
        &pool,
        &NewUser {
            username: username.clone(),
            email,
            password_hash,
            is_verified: false,
        },
    )
    .await?;

    match validation::slug(&username) {
        Ok(slug) => {
            let profile = NewProfile {
                user_id: user.id,
                slug,
                name: format!("{username} - Main Profile"),
                title: Some(username.clone()),
                bio: None,
            };
            if let Err(e) = profiles::create(&pool, &profile).await {
                tracing::warn!(user_id = user.id, "Default profile not created: {}", e);
            }
        }
        Err(_) => {
            tracing::debug!(user_id = user.id, "Username is not a valid slug, no default profile");
        }
    }

    tracing::info!(user_id = user.id, "User registered");

    Ok(created(issue_tokens(&pool, &user, &meta).await?))
}

/// POST /api/v1/auth/login
pub async fn login(
    meta: ClientMeta,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let email = validation::email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let pool = db::pool()?;

    let invalid = || ApiError::unauthorized("Invalid email or password");
    let user = users::find_by_email(&pool, &email).await?.ok_or_else(invalid)?;

    if !auth::verify_password(payload.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = user.id, "Failed login attempt");
        return Err(invalid());
    }

    if !user.is_active {
        return Err(ApiError::Forbidden("Account is disabled".to_string()));
    }

    let purged = sessions::delete_expired_for_user(&pool, user.id).await?;
    if purged > 0 {
        tracing::debug!(user_id = user.id, purged, "Removed expired sessions");
    }

    tracing::info!(user_id = user.id, "User logged in");

    Ok(ok(issue_tokens(&pool, &user, &meta).await?))
}

/// POST /api/v1/auth/refresh
///
/// Issues a new access token; the refresh token itself stays valid until it
/// expires or the user logs out.
pub async fn refresh(
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<AccessTokenResponse>>> {
    let token = payload.refresh_token.trim();
    if token.is_empty() {
        return Err(ApiError::validation("Refresh token is required"));
    }

    let pool = db::pool()?;

    let invalid = || ApiError::unauthorized("Invalid or expired refresh token");
    let session = sessions::find_valid_by_hash(&pool, &hash_refresh_token(token))
        .await?
        .ok_or_else(invalid)?;
    let user = users::find_active_by_id(&pool, session.user_id)
        .await?
        .ok_or_else(invalid)?;

    let access_token = create_access_token(&user)
        .map_err(|e| ApiError::internal(format!("Failed to create access token: {e}")))?;

    Ok(ok(AccessTokenResponse {
        access_token,
        expires_in: CONFIG.access_token_ttl_secs(),
    }))
}

/// POST /api/v1/auth/logout
///
/// Idempotent: always succeeds, whatever the body holds.
pub async fn logout(body: Bytes) -> Json<ApiResponse<MessageData>> {
    let payload: LogoutRequest = serde_json::from_slice(&body).unwrap_or_default();

    if let (Some(token), Some(pool)) = (payload.refresh_token, db::get_pool()) {
        if let Err(e) = sessions::delete_by_hash(&pool, &hash_refresh_token(token.trim())).await {
            tracing::warn!("Failed to delete session on logout: {}", e);
        }
    }

    message("Logged out successfully")
}

/// POST /api/v1/auth/send-otp
pub async fn send_otp(
    JsonBody(payload): JsonBody<SendOtpRequest>,
) -> ApiResult<Json<ApiResponse<OtpSentResponse>>> {
    let email = validation::email(&payload.email)?;
    validation::password(&payload.password)?;

    let pool = db::pool()?;
    if users::email_exists(&pool, &email).await? {
        return Err(ApiError::conflict("Email already registered"));
    }

    let code = OTP_STORE.issue(&email).await;
    if let Err(e) = mail::send_otp(&email, &code).await {
        OTP_STORE.remove(&email).await;
        return Err(ApiError::internal(format!("Failed to send OTP email: {e}")));
    }

    Ok(ok(OtpSentResponse {
        message: "Verification code sent to your email".to_string(),
        expires_in: auth::otp::OTP_TTL.as_secs(),
    }))
}

/// POST /api/v1/auth/verify-otp
pub async fn verify_otp(
    JsonBody(payload): JsonBody<VerifyOtpRequest>,
) -> ApiResult<Json<ApiResponse<MessageData>>> {
    let email = validation::email(&payload.email)?;

    if !OTP_STORE.verify(&email, &payload.otp).await {
        return Err(ApiError::validation("Invalid or expired OTP"));
    }

    Ok(message("OTP verified"))
}

/// POST /api/v1/auth/complete-registration
///
/// Verified account plus its first profile. The code is only consumed once
/// the account exists.
pub async fn complete_registration(
    meta: ClientMeta,
    JsonBody(payload): JsonBody<CompleteRegistrationRequest>,
) -> ApiResult<Created<AuthResponse>> {
    let email = validation::email(&payload.email)?;
    let username = validation::username(&payload.username)?;
    validation::password(&payload.password)?;
    let slug = match validation::optional_text(payload.slug) {
        Some(slug) => validation::slug(&slug)?,
        None => validation::slug(&username)?,
    };

    if !OTP_STORE.verify(&email, &payload.otp).await {
        return Err(ApiError::validation("Invalid or expired OTP"));
    }

    let pool = db::pool()?;
    ensure_identity_free(&pool, &email, &username).await?;
    if profiles::slug_exists(&pool, &slug).await? {
        return Err(ApiError::conflict("Slug already taken"));
    }

    let password_hash = auth::hash_password(payload.password).await?;
    let user = users::create(
        &pool,
        &NewUser {
            username: username.clone(),
            email: email.clone(),
            password_hash,
            is_verified: true,
        },
    )
    .await?;

    let profile = NewProfile {
        user_id: user.id,
        slug,
        name: username.clone(),
        title: Some(username),
        bio: None,
    };
    if let Err(e) = profiles::create(&pool, &profile).await {
        tracing::warn!(user_id = user.id, "First profile not created: {}", e);
    }

    OTP_STORE.remove(&email).await;

    tracing::info!(user_id = user.id, "Registration completed");

    Ok(created(issue_tokens(&pool, &user, &meta).await?))
}
