use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use super::jwt::{parse_bearer, verify_access_token, Claims};
use crate::error::ApiError;

/// Caller identity placed in request extensions by [`require_auth`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            email: claims.email,
            is_admin: claims.is_admin,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Reject the request with 401 unless it carries a valid bearer token.
/// The caller is also attached to the response for request logging.
pub async fn require_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

    let token = header
        .to_str()
        .ok()
        .and_then(parse_bearer)
        .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format"))?;

    let claims = verify_access_token(token).map_err(|e| {
        tracing::debug!("Rejected access token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    let user = AuthUser::from(claims);
    request.extensions_mut().insert(user.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(user);
    Ok(response)
}

/// Must run inside [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.is_admin => Ok(next.run(request).await),
        Some(user) => {
            tracing::warn!(user_id = user.user_id, "Non-admin attempted admin access");
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
        None => Err(ApiError::unauthorized("Authentication required")),
    }
}
