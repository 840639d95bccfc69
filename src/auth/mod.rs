//! Authentication primitives: access tokens, the bearer middleware, the
//! registration OTP store, password hashing and refresh-token helpers.

pub mod jwt;
pub mod middleware;
pub mod otp;

use bcrypt::{hash, verify, DEFAULT_COST};
use rand::distr::{Alphanumeric, SampleString};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

pub use jwt::{create_access_token, verify_access_token, Claims};
pub use middleware::{require_admin, require_auth, AuthUser};

const REFRESH_TOKEN_LEN: usize = 64;

/// Opaque refresh token handed to the client once.
pub fn generate_refresh_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), REFRESH_TOKEN_LEN)
}

/// Hex SHA-256 digest; the only form of a refresh token that is persisted.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// bcrypt is CPU-bound, so it runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, ApiError> {
    match tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST)).await {
        Ok(Ok(hashed)) => Ok(hashed),
        Ok(Err(e)) => Err(ApiError::internal(format!("Failed to hash password: {e}"))),
        Err(e) => Err(ApiError::internal(format!(
            "spawn_blocking panic during hash: {e}"
        ))),
    }
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, ApiError> {
    match tokio::task::spawn_blocking(move || verify(password, &password_hash)).await {
        Ok(Ok(valid)) => Ok(valid),
        Ok(Err(e)) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            Ok(false)
        }
        Err(e) => Err(ApiError::internal(format!(
            "spawn_blocking panic during verify: {e}"
        ))),
    }
}
