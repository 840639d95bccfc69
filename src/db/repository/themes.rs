use sqlx::PgPool;

use crate::db::models::Theme;

const THEME_COLUMNS: &str = r#"
    id, profile_id, bg_type, bg_value, button_style, button_color, text_color, font,
    layout, container_style, enable_animations, enable_glass_effect, shadow_intensity,
    boxed_enabled, boxed_outer_bg_type, boxed_outer_bg_value, boxed_container_bg,
    boxed_max_width, boxed_radius, boxed_shadow, created_at, updated_at
"#;

pub async fn find_by_profile(pool: &PgPool, profile_id: i32) -> Result<Option<Theme>, sqlx::Error> {
    sqlx::query_as::<_, Theme>(&format!(
        "SELECT {THEME_COLUMNS} FROM themes WHERE profile_id = $1"
    ))
    .bind(profile_id)
    .fetch_optional(pool)
    .await
}

/// Full-row update keyed by `profile_id`.
pub async fn update(pool: &PgPool, theme: &Theme) -> Result<Theme, sqlx::Error> {
    sqlx::query_as::<_, Theme>(&format!(
        r#"
        UPDATE themes SET
            bg_type = $1, bg_value = $2, button_style = $3, button_color = $4, text_color = $5,
            font = $6, layout = $7, container_style = $8, enable_animations = $9,
            enable_glass_effect = $10, shadow_intensity = $11, boxed_enabled = $12,
            boxed_outer_bg_type = $13, boxed_outer_bg_value = $14, boxed_container_bg = $15,
            boxed_max_width = $16, boxed_radius = $17, boxed_shadow = $18, updated_at = now()
        WHERE profile_id = $19
        RETURNING {THEME_COLUMNS}
        "#
    ))
    .bind(&theme.bg_type)
    .bind(&theme.bg_value)
    .bind(&theme.button_style)
    .bind(&theme.button_color)
    .bind(&theme.text_color)
    .bind(&theme.font)
    .bind(&theme.layout)
    .bind(&theme.container_style)
    .bind(theme.enable_animations)
    .bind(theme.enable_glass_effect)
    .bind(&theme.shadow_intensity)
    .bind(theme.boxed_enabled)
    .bind(&theme.boxed_outer_bg_type)
    .bind(&theme.boxed_outer_bg_value)
    .bind(&theme.boxed_container_bg)
    .bind(theme.boxed_max_width)
    .bind(theme.boxed_radius)
    .bind(theme.boxed_shadow)
    .bind(theme.profile_id)
    .fetch_one(pool)
    .await
}
