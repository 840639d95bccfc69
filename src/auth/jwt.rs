use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::db::models::User;

/// HS256 access-token claims.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_user(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Sign an access token for `user` with the configured secret and lifetime.
pub fn create_access_token(user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::for_user(user, Duration::hours(CONFIG.jwt.expiry_hours));
    sign(&claims, &CONFIG.jwt.secret)
}

pub fn verify_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    verify(token, &CONFIG.jwt.secret)
}

fn sign(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn verify(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Token part of an `Authorization` header value. The scheme is matched
/// case-insensitively.
pub fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_user(id: i32, is_admin: bool) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            is_verified: true,
            is_active: true,
            is_admin,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_issued_token_round_trips_claims() {
        let user = test_user(7, true);
        let token = create_access_token(&user).unwrap();
        let claims = verify_access_token(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "user7");
        assert_eq!(claims.email, "user7@example.com");
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, CONFIG.jwt.expiry_hours * 3600);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let claims = Claims::for_user(&test_user(1, false), Duration::hours(1));
        let token = sign(&claims, "some-other-secret").unwrap();
        assert!(verify_access_token(&token).is_err());
        assert_eq!(verify(&token, "some-other-secret").unwrap(), claims);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let claims = Claims::for_user(&test_user(1, false), Duration::hours(-2));
        let token = sign(&claims, &CONFIG.jwt.secret).unwrap();
        assert!(verify_access_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let token = create_access_token(&test_user(1, false)).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_claims = Claims::for_user(&test_user(1, true), Duration::hours(1));
        let forged = sign(&forged_claims, "attacker").unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;
        assert!(verify_access_token(&parts.join(".")).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(verify_access_token("invalid.jwt.token").is_err());
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("BEARER  abc "), Some("abc"));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer(""), None);
    }
}
