//! Database Models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Registered account. `password_hash` never leaves the server; use
/// [`UserPublic`] for responses.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_verified: user.is_verified,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// Fields for a user insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: i32,
    pub user_id: i32,
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub avatar: String,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Profile plus its active link count and summed click counters.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProfileWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: Profile,
    pub link_count: i64,
    pub total_clicks: i64,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: i32,
    pub slug: String,
    pub name: String,
    pub title: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Theme {
    pub id: i32,
    pub profile_id: i32,
    pub bg_type: String,
    pub bg_value: Option<String>,
    pub button_style: String,
    pub button_color: String,
    pub text_color: String,
    pub font: String,
    pub layout: String,
    pub container_style: String,
    pub enable_animations: bool,
    pub enable_glass_effect: bool,
    pub shadow_intensity: String,
    pub boxed_enabled: bool,
    pub boxed_outer_bg_type: Option<String>,
    pub boxed_outer_bg_value: Option<String>,
    pub boxed_container_bg: String,
    pub boxed_max_width: i32,
    pub boxed_radius: i32,
    pub boxed_shadow: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,
    pub profile_id: i32,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub position: i32,
    pub is_expanded: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub profile_id: i32,
    pub name: String,
    pub icon: String,
    pub color: String,
    /// `None` appends after the current last category.
    pub position: Option<i32>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Link {
    pub id: i32,
    pub profile_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i32>,
    pub title: String,
    pub url: String,
    pub icon: String,
    pub position: i32,
    pub clicks: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewLink {
    pub profile_id: i32,
    pub category_id: Option<i32>,
    pub title: String,
    pub url: String,
    pub icon: String,
    /// `None` appends after the current last link.
    pub position: Option<i32>,
}

/// One row of the append-only click log.
#[derive(Debug, Clone, Default)]
pub struct NewClick {
    pub link_id: i32,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Refresh-token record. Only the SHA-256 digest of the token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i32,
    pub refresh_token_hash: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i32,
    pub refresh_token_hash: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// `{id, position}` pair used by the bulk reorder endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: i32,
    pub position: i32,
}
