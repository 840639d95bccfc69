//! HTTP handlers grouped by resource, plus the response envelope and the
//! extractors they share.

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod categories;
pub mod health;
pub mod links;
pub mod profiles;
pub mod public;
pub mod themes;
pub mod users;
pub mod validation;

use axum::{
    extract::{ConnectInfo, FromRequest, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::{convert::Infallible, net::SocketAddr};

use crate::error::ApiError;

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Success envelope: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageData {
    pub message: String,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok(data))
}

pub fn message(text: impl Into<String>) -> Json<ApiResponse<MessageData>> {
    ok(MessageData {
        message: text.into(),
    })
}

/// For `Option<Option<T>>` fields: absent is `None`, `null` is `Some(None)`.
/// Use together with `#[serde(default)]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `axum::Json` with malformed bodies reported as validation errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path` with unparsable segments reported as validation errors.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// `axum::extract::Query` with the same error body as [`JsonBody`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Client address and agent, as recorded with sessions and clicks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// Matches the width of the `ip` columns.
const IP_MAX: usize = 45;

impl ClientMeta {
    fn from_parts(parts: &Parts) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Self {
            ip: forwarded_ip(&parts.headers)
                .or(peer)
                .map(|ip| ip.chars().take(IP_MAX).collect()),
            user_agent: header_text(&parts.headers, header::USER_AGENT),
            referer: header_text(&parts.headers, header::REFERER),
        }
    }
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    header_text(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_text(headers, "x-real-ip"))
}

fn header_text(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    use crate::auth::create_access_token;
    use crate::auth::jwt::tests::test_user;

    pub fn bearer(user_id: i32, is_admin: bool) -> String {
        let token = create_access_token(&test_user(user_id, is_admin)).unwrap();
        format!("Bearer {token}")
    }

    /// Send one request and return the status and parsed JSON body.
    pub async fn send(
        app: Router,
        method: &str,
        uri: &str,
        auth: Option<String>,
        json: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            req = req.header("authorization", auth);
        }
        let body = match json {
            Some(value) => {
                req = req.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };
        let res = app.oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, value)
    }
}
