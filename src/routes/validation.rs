//! Request field checks shared by the handlers. Each returns the cleaned
//! value or a 400 [`ApiError::Validation`].

use regex::Regex;

use crate::error::ApiError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 8;
pub const SLUG_MIN: usize = 3;
pub const SLUG_MAX: usize = 50;
pub const NAME_MAX: usize = 100;
pub const URL_MAX: usize = 500;

lazy_static::lazy_static! {
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9_-]+$").unwrap();
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref HEX_COLOR_REGEX: Regex = Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap();
}

pub fn username(raw: &str) -> Result<String, ApiError> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ApiError::validation(format!(
            "Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(ApiError::validation("Username must not contain spaces"));
    }
    Ok(username.to_string())
}

/// Emails are compared and stored lower-cased.
pub fn email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if !EMAIL_REGEX.is_match(&email) {
        return Err(ApiError::validation("Invalid email format"));
    }
    Ok(email)
}

pub fn password(raw: &str) -> Result<(), ApiError> {
    if raw.chars().count() < PASSWORD_MIN {
        return Err(ApiError::validation(format!(
            "Password must be at least {PASSWORD_MIN} characters"
        )));
    }
    Ok(())
}

/// Slugs are lower-cased; `[a-z0-9_-]`, 3 to 50 characters.
pub fn slug(raw: &str) -> Result<String, ApiError> {
    let slug = raw.trim().to_lowercase();
    if !(SLUG_MIN..=SLUG_MAX).contains(&slug.len()) {
        return Err(ApiError::validation(format!(
            "Slug must be between {SLUG_MIN} and {SLUG_MAX} characters"
        )));
    }
    if !SLUG_REGEX.is_match(&slug) {
        return Err(ApiError::validation(
            "Slug may only contain letters, numbers, hyphens and underscores",
        ));
    }
    Ok(slug)
}

/// Required free-text field such as a title or a name.
pub fn required(field: &str, raw: &str, max: usize) -> Result<String, ApiError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ApiError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Link targets: http(s) URLs with a host, `mailto:` or `tel:`.
pub fn link_url(raw: &str) -> Result<String, ApiError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(ApiError::validation("URL is required"));
    }
    if url.len() > URL_MAX {
        return Err(ApiError::validation(format!(
            "URL must be at most {URL_MAX} characters"
        )));
    }

    let lower = url.to_ascii_lowercase();
    let valid = if let Some(rest) = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
    {
        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        !host.is_empty() && !host.chars().any(char::is_whitespace)
    } else if let Some(rest) = lower
        .strip_prefix("mailto:")
        .or_else(|| lower.strip_prefix("tel:"))
    {
        !rest.trim().is_empty()
    } else {
        false
    };

    if !valid {
        return Err(ApiError::validation(
            "URL must start with http://, https://, mailto: or tel:",
        ));
    }
    Ok(url.to_string())
}

pub fn color(raw: &str) -> Result<String, ApiError> {
    let color = raw.trim();
    if !HEX_COLOR_REGEX.is_match(color) {
        return Err(ApiError::validation("Color must be a hex value like #667eea"));
    }
    Ok(color.to_string())
}

/// Empty optional text becomes `None`.
pub fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_bounds() {
        assert!(username("ab").is_err());
        assert_eq!(username("  abc ").unwrap(), "abc");
        assert!(username(&"a".repeat(50)).is_ok());
        assert!(username(&"a".repeat(51)).is_err());
        assert!(username("two words").is_err());
    }

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(email(" Alice@Example.COM ").unwrap(), "alice@example.com");
        assert!(email("").is_err());
        assert!(email("no-at-sign").is_err());
        assert!(email("a@b").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(password("short").is_err());
        assert!(password("12345678").is_ok());
    }

    #[test]
    fn test_slug_rules() {
        assert_eq!(slug("My_Page-1").unwrap(), "my_page-1");
        assert!(slug("ab").is_err());
        assert!(slug(&"a".repeat(51)).is_err());
        assert!(slug("has space").is_err());
        assert!(slug("dots.not.ok").is_err());
    }

    #[test]
    fn test_required_trims_and_limits() {
        assert_eq!(required("Title", "  Hello ", 100).unwrap(), "Hello");
        assert!(required("Title", "   ", 100).is_err());
        assert!(required("Title", &"x".repeat(101), 100).is_err());
    }

    #[test]
    fn test_link_url_schemes() {
        assert!(link_url("https://example.com/path?q=1").is_ok());
        assert!(link_url("HTTP://example.com").is_ok());
        assert!(link_url("mailto:someone@example.com").is_ok());
        assert!(link_url("tel:+15551234").is_ok());
        assert!(link_url("javascript:alert(1)").is_err());
        assert!(link_url("ftp://example.com").is_err());
        assert!(link_url("https://").is_err());
        assert!(link_url("mailto:").is_err());
        assert!(link_url("").is_err());
        assert!(link_url(&format!("https://example.com/{}", "a".repeat(500))).is_err());
    }

    #[test]
    fn test_color() {
        assert!(color("#667eea").is_ok());
        assert!(color("#fff").is_ok());
        assert!(color("red").is_err());
        assert!(color("#12345").is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" hi ".into())), Some("hi".into()));
        assert_eq!(optional_text(None), None);
    }
}
