//! Visual theme of a profile.

use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ok, profiles::ensure_profile_owner, validation, ApiResponse, JsonBody, PathParam};
use crate::auth::AuthUser;
use crate::db::{self, models::Theme, repository::themes};
use crate::error::{ApiError, ApiResult};

/// Width of the short theme columns.
const SHORT_MAX: usize = 20;
const FONT_MAX: usize = 50;
const VALUE_MAX: usize = 1000;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateThemeRequest {
    pub bg_type: Option<String>,
    pub bg_value: Option<String>,
    pub button_style: Option<String>,
    pub button_color: Option<String>,
    pub text_color: Option<String>,
    pub font: Option<String>,
    pub layout: Option<String>,
    pub container_style: Option<String>,
    pub enable_animations: Option<bool>,
    pub enable_glass_effect: Option<bool>,
    pub shadow_intensity: Option<String>,
    pub boxed_enabled: Option<bool>,
    pub boxed_outer_bg_type: Option<String>,
    pub boxed_outer_bg_value: Option<String>,
    pub boxed_container_bg: Option<String>,
    pub boxed_max_width: Option<i32>,
    pub boxed_radius: Option<i32>,
    pub boxed_shadow: Option<bool>,
}

fn set_text(target: &mut String, field: &str, value: Option<String>, max: usize) -> ApiResult<()> {
    if let Some(value) = value {
        *target = validation::required(field, &value, max)?;
    }
    Ok(())
}

/// Empty strings clear an optional column.
fn set_optional(
    target: &mut Option<String>,
    field: &str,
    value: Option<String>,
    max: usize,
) -> ApiResult<()> {
    if let Some(value) = value {
        *target = match value.trim() {
            "" => None,
            text => Some(validation::required(field, text, max)?),
        };
    }
    Ok(())
}

fn set_color(target: &mut String, value: Option<String>) -> ApiResult<()> {
    if let Some(value) = value {
        *target = validation::color(&value)?;
    }
    Ok(())
}

fn set_non_negative(target: &mut i32, field: &str, value: Option<i32>) -> ApiResult<()> {
    if let Some(value) = value {
        if value < 0 {
            return Err(ApiError::validation(format!("{field} must not be negative")));
        }
        *target = value;
    }
    Ok(())
}

impl UpdateThemeRequest {
    /// Apply the provided fields to `theme`, validating each one.
    pub fn apply(self, theme: &mut Theme) -> ApiResult<()> {
        set_text(&mut theme.bg_type, "bg_type", self.bg_type, SHORT_MAX)?;
        set_optional(&mut theme.bg_value, "bg_value", self.bg_value, VALUE_MAX)?;
        set_text(&mut theme.button_style, "button_style", self.button_style, SHORT_MAX)?;
        set_color(&mut theme.button_color, self.button_color)?;
        set_color(&mut theme.text_color, self.text_color)?;
        set_text(&mut theme.font, "font", self.font, FONT_MAX)?;
        set_text(&mut theme.layout, "layout", self.layout, SHORT_MAX)?;
        set_text(
            &mut theme.container_style,
            "container_style",
            self.container_style,
            SHORT_MAX,
        )?;
        set_text(
            &mut theme.shadow_intensity,
            "shadow_intensity",
            self.shadow_intensity,
            SHORT_MAX,
        )?;
        set_optional(
            &mut theme.boxed_outer_bg_type,
            "boxed_outer_bg_type",
            self.boxed_outer_bg_type,
            SHORT_MAX,
        )?;
        set_optional(
            &mut theme.boxed_outer_bg_value,
            "boxed_outer_bg_value",
            self.boxed_outer_bg_value,
            VALUE_MAX,
        )?;
        set_text(
            &mut theme.boxed_container_bg,
            "boxed_container_bg",
            self.boxed_container_bg,
            SHORT_MAX,
        )?;
        set_non_negative(&mut theme.boxed_max_width, "boxed_max_width", self.boxed_max_width)?;
        set_non_negative(&mut theme.boxed_radius, "boxed_radius", self.boxed_radius)?;

        if let Some(v) = self.enable_animations {
            theme.enable_animations = v;
        }
        if let Some(v) = self.enable_glass_effect {
            theme.enable_glass_effect = v;
        }
        if let Some(v) = self.boxed_enabled {
            theme.boxed_enabled = v;
        }
        if let Some(v) = self.boxed_shadow {
            theme.boxed_shadow = v;
        }

        Ok(())
    }
}

/// GET /api/v1/profiles/{profile_id}/theme
pub async fn get_theme(
    auth: AuthUser,
    PathParam(profile_id): PathParam<i32>,
) -> ApiResult<Json<ApiResponse<Theme>>> {
    let pool = db::pool()?;
    ensure_profile_owner(&pool, profile_id, &auth).await?;

    let theme = themes::find_by_profile(&pool, profile_id)
        .await?
        .ok_or(ApiError::NotFound("Theme"))?;

    Ok(ok(theme))
}

/// PUT /api/v1/profiles/{profile_id}/theme
pub async fn update_theme(
    auth: AuthUser,
    PathParam(profile_id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateThemeRequest>,
) -> ApiResult<Json<ApiResponse<Theme>>> {
    let pool = db::pool()?;
    ensure_profile_owner(&pool, profile_id, &auth).await?;

    let mut theme = themes::find_by_profile(&pool, profile_id)
        .await?
        .ok_or(ApiError::NotFound("Theme"))?;
    payload.apply(&mut theme)?;

    Ok(ok(themes::update(&pool, &theme).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn default_theme() -> Theme {
        Theme {
            id: 1,
            profile_id: 1,
            bg_type: "gradient".into(),
            bg_value: Some("linear-gradient(135deg, #667eea 0%, #764ba2 100%)".into()),
            button_style: "rounded".into(),
            button_color: "#667eea".into(),
            text_color: "#333333".into(),
            font: "Inter".into(),
            layout: "centered".into(),
            container_style: "default".into(),
            enable_animations: true,
            enable_glass_effect: false,
            shadow_intensity: "medium".into(),
            boxed_enabled: false,
            boxed_outer_bg_type: None,
            boxed_outer_bg_value: None,
            boxed_container_bg: "#ffffff".into(),
            boxed_max_width: 480,
            boxed_radius: 16,
            boxed_shadow: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut theme = default_theme();
        let request: UpdateThemeRequest =
            serde_json::from_value(serde_json::json!({"font": "Roboto", "boxed_enabled": true}))
                .unwrap();
        request.apply(&mut theme).unwrap();
        assert_eq!(theme.font, "Roboto");
        assert!(theme.boxed_enabled);
        assert_eq!(theme.button_color, "#667eea");
        assert_eq!(theme.boxed_max_width, 480);
    }

    #[test]
    fn test_empty_string_clears_optional_value() {
        let mut theme = default_theme();
        let request = UpdateThemeRequest {
            bg_value: Some(String::new()),
            ..Default::default()
        };
        request.apply(&mut theme).unwrap();
        assert_eq!(theme.bg_value, None);
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        let mut theme = default_theme();
        let request = UpdateThemeRequest {
            text_color: Some("black".into()),
            ..Default::default()
        };
        assert!(request.apply(&mut theme).is_err());
    }

    #[test]
    fn test_negative_width_is_rejected() {
        let mut theme = default_theme();
        let request = UpdateThemeRequest {
            boxed_max_width: Some(-1),
            ..Default::default()
        };
        assert!(request.apply(&mut theme).is_err());
    }

    #[test]
    fn test_overlong_short_field_is_rejected() {
        let mut theme = default_theme();
        let request = UpdateThemeRequest {
            layout: Some("x".repeat(21)),
            ..Default::default()
        };
        assert!(request.apply(&mut theme).is_err());
    }
}
