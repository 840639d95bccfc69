//! In-memory one-time codes for email verification during registration.

use rand::Rng;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

/// Codes stay valid for ten minutes.
pub const OTP_TTL: Duration = Duration::from_secs(10 * 60);

/// Wrong guesses allowed before the pending code is thrown away.
pub const MAX_ATTEMPTS: u32 = 5;

lazy_static::lazy_static! {
    pub static ref OTP_STORE: OtpStore = OtpStore::new();
}

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    expires_at: Instant,
    failed_attempts: u32,
}

impl OtpEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Email -> pending code. Entries are keyed by the lower-cased email.
#[derive(Debug)]
pub struct OtpStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, OtpEntry>>,
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OtpStore {
    pub fn new() -> Self {
        Self::with_ttl(OTP_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a fresh code for `email`, replacing any previous one.
    pub async fn issue(&self, email: &str) -> String {
        let code = generate_code();
        let now = Instant::now();

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(
            normalize(email),
            OtpEntry {
                code: code.clone(),
                expires_at: now + self.ttl,
                failed_attempts: 0,
            },
        );

        code
    }

    /// A correct code is not consumed; see [`OtpStore::remove`]. After
    /// [`MAX_ATTEMPTS`] wrong guesses the code is dropped and a new one must
    /// be issued.
    pub async fn verify(&self, email: &str, code: &str) -> bool {
        let key = normalize(email);
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(&key) else {
            return false;
        };

        if entry.is_expired(Instant::now()) {
            entries.remove(&key);
            return false;
        }
        if entry.code == code.trim() {
            return true;
        }

        entry.failed_attempts += 1;
        if entry.failed_attempts >= MAX_ATTEMPTS {
            tracing::warn!(email = %key, "OTP discarded after too many wrong attempts");
            entries.remove(&key);
        }
        false
    }

    pub async fn remove(&self, email: &str) {
        self.entries.write().await.remove(&normalize(email));
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Six digits, zero-padded.
fn generate_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_verify_issued_code() {
        let store = OtpStore::new();
        let code = store.issue("alice@example.com").await;
        assert!(store.verify("alice@example.com", &code).await);
        assert!(store.verify("Alice@Example.com ", &code).await);
        // verification does not consume
        assert!(store.verify("alice@example.com", &code).await);
    }

    #[tokio::test]
    async fn test_wrong_code_or_unknown_email_fails() {
        let store = OtpStore::new();
        let code = store.issue("alice@example.com").await;
        let wrong = if code == "000000" { "000001" } else { "000000" };
        assert!(!store.verify("alice@example.com", wrong).await);
        assert!(!store.verify("bob@example.com", &code).await);
    }

    #[tokio::test]
    async fn test_expired_code_fails() {
        let store = OtpStore::with_ttl(Duration::ZERO);
        let code = store.issue("alice@example.com").await;
        assert!(!store.verify("alice@example.com", &code).await);
    }

    #[tokio::test]
    async fn test_reissue_replaces_previous_code() {
        let store = OtpStore::new();
        let mut first = store.issue("alice@example.com").await;
        let mut second = store.issue("alice@example.com").await;
        while second == first {
            first = second;
            second = store.issue("alice@example.com").await;
        }
        assert!(!store.verify("alice@example.com", &first).await);
        assert!(store.verify("alice@example.com", &second).await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_code_is_dropped_after_too_many_wrong_guesses() {
        let store = OtpStore::new();
        let code = store.issue("alice@example.com").await;
        let wrong = if code == "000000" { "000001" } else { "000000" };

        for _ in 0..MAX_ATTEMPTS - 1 {
            assert!(!store.verify("alice@example.com", wrong).await);
        }
        assert!(store.verify("alice@example.com", &code).await);

        assert!(!store.verify("alice@example.com", wrong).await);
        assert!(!store.verify("alice@example.com", &code).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_deletes_entry() {
        let store = OtpStore::new();
        let code = store.issue("alice@example.com").await;
        store.remove("ALICE@example.com").await;
        assert!(!store.verify("alice@example.com", &code).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_evicted_on_write() {
        let store = OtpStore::with_ttl(Duration::ZERO);
        store.issue("a@example.com").await;
        store.issue("b@example.com").await;
        store.issue("c@example.com").await;
        assert_eq!(store.len().await, 1);
    }
}
