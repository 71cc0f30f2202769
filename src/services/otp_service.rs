use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::errors::{AppError, Result};
use crate::models::otp::OtpRecord;

/// Outcome of checking a submitted code against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    NotFound,
    Mismatch,
}

impl VerifyOutcome {
    pub fn into_result(self) -> Result<()> {
        match self {
            VerifyOutcome::Verified => Ok(()),
            VerifyOutcome::NotFound => Err(AppError::OtpNotFound),
            VerifyOutcome::Mismatch => Err(AppError::InvalidOtp),
        }
    }
}

// Generate 6-digit OTP
pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    format_otp(rng.gen_range(0..1_000_000))
}

fn format_otp(draw: u32) -> String {
    format!("{:06}", draw)
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Replaces any code already held for `identifier`.
    async fn put(&self, identifier: &str, code: &str);

    async fn get(&self, identifier: &str) -> Option<String>;

    async fn delete(&self, identifier: &str);

    /// Compares `code` byte-for-byte and removes the entry on a match.
    async fn verify(&self, identifier: &str, code: &str) -> VerifyOutcome;

    /// Drops expired entries, returning how many were removed.
    async fn purge_expired(&self) -> usize;
}

#[derive(Clone, Default)]
pub struct InMemoryOtpStore {
    entries: Arc<Mutex<HashMap<String, OtpRecord>>>,
    ttl: Option<chrono::Duration>,
}

impl InMemoryOtpStore {
    pub fn new(ttl: Option<Duration>) -> Result<Self> {
        let ttl = ttl
            .map(|ttl| {
                chrono::Duration::from_std(ttl)
                    .map_err(|e| AppError::configuration(format!("OTP TTL out of range: {}", e)))
            })
            .transpose()?;

        Ok(Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        })
    }

    pub fn expires(&self) -> bool {
        self.ttl.is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn put(&self, identifier: &str, code: &str) {
        let record = OtpRecord::new(code, Utc::now(), self.ttl);
        self.entries
            .lock()
            .await
            .insert(identifier.to_string(), record);
    }

    async fn get(&self, identifier: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        evict_if_expired(&mut entries, identifier);
        entries.get(identifier).map(|record| record.code.clone())
    }

    async fn delete(&self, identifier: &str) {
        self.entries.lock().await.remove(identifier);
    }

    async fn verify(&self, identifier: &str, code: &str) -> VerifyOutcome {
        let mut entries = self.entries.lock().await;
        evict_if_expired(&mut entries, identifier);

        let outcome = match entries.get(identifier) {
            None => VerifyOutcome::NotFound,
            Some(record) if record.code == code => VerifyOutcome::Verified,
            Some(_) => VerifyOutcome::Mismatch,
        };

        if outcome == VerifyOutcome::Verified {
            entries.remove(identifier);
        }
        outcome
    }

    async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, record| !record.is_expired(now));
        before - entries.len()
    }
}

fn evict_if_expired(entries: &mut HashMap<String, OtpRecord>, identifier: &str) {
    if entries
        .get(identifier)
        .is_some_and(|record| record.is_expired(Utc::now()))
    {
        entries.remove(identifier);
    }
}

/// Periodically removes expired codes so unverified entries do not pile up.
pub fn spawn_expiry_sweeper(store: Arc<dyn OtpStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = store.purge_expired().await;
            if removed > 0 {
                tracing::debug!("Swept {} expired OTP(s)", removed);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_ascii_digits() {
        for _ in 0..1_000 {
            let code = generate_otp();
            assert_eq!(code.len(), 6, "code {code:?}");
            assert!(code.bytes().all(|b| b.is_ascii_digit()), "code {code:?}");
        }
    }

    #[test]
    fn small_draws_keep_leading_zeros() {
        assert_eq!(format_otp(0), "000000");
        assert_eq!(format_otp(42), "000042");
        assert_eq!(format_otp(999_999), "999999");
    }

    #[tokio::test]
    async fn put_then_get_returns_latest_code() {
        let store = InMemoryOtpStore::new(None).unwrap();
        store.put("a@b.com", "111111").await;
        assert_eq!(store.get("a@b.com").await.as_deref(), Some("111111"));

        store.put("a@b.com", "222222").await;
        assert_eq!(store.get("a@b.com").await.as_deref(), Some("222222"));
        assert_eq!(store.len().await, 1);

        store.delete("a@b.com").await;
        assert_eq!(store.get("a@b.com").await, None);
    }

    #[tokio::test]
    async fn verify_consumes_code_on_match() {
        let store = InMemoryOtpStore::new(None).unwrap();
        store.put("a@b.com", "123456").await;

        assert_eq!(store.verify("a@b.com", "123456").await, VerifyOutcome::Verified);
        assert_eq!(store.verify("a@b.com", "123456").await, VerifyOutcome::NotFound);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn mismatch_keeps_code() {
        let store = InMemoryOtpStore::new(None).unwrap();
        store.put("a@b.com", "123456").await;

        assert_eq!(store.verify("a@b.com", "000000").await, VerifyOutcome::Mismatch);
        assert_eq!(store.verify("a@b.com", "123456 ").await, VerifyOutcome::Mismatch);
        assert_eq!(store.get("a@b.com").await.as_deref(), Some("123456"));
    }

    #[tokio::test]
    async fn identifiers_are_independent() {
        let store = InMemoryOtpStore::new(None).unwrap();
        store.put("a@b.com", "123456").await;
        store.put("c@d.com", "123456").await;

        assert_eq!(store.verify("a@b.com", "123456").await, VerifyOutcome::Verified);
        assert_eq!(store.get("c@d.com").await.as_deref(), Some("123456"));
        assert_eq!(store.verify("A@B.COM", "123456").await, VerifyOutcome::NotFound);
    }

    #[tokio::test]
    async fn zero_ttl_expires_immediately() {
        let store = InMemoryOtpStore::new(Some(Duration::ZERO)).unwrap();
        assert!(store.expires());
        store.put("a@b.com", "123456").await;

        assert_eq!(store.get("a@b.com").await, None);
        store.put("a@b.com", "123456").await;
        assert_eq!(store.verify("a@b.com", "123456").await, VerifyOutcome::NotFound);
    }

    #[tokio::test]
    async fn purge_drops_only_expired_entries() {
        let expiring = InMemoryOtpStore::new(Some(Duration::ZERO)).unwrap();
        expiring.put("a@b.com", "123456").await;
        expiring.put("c@d.com", "654321").await;
        assert_eq!(expiring.purge_expired().await, 2);
        assert!(expiring.is_empty().await);

        let durable = InMemoryOtpStore::new(None).unwrap();
        durable.put("a@b.com", "123456").await;
        assert_eq!(durable.purge_expired().await, 0);
        assert_eq!(durable.len().await, 1);
    }

    #[tokio::test]
    async fn sweeper_purges_in_background() {
        let store = InMemoryOtpStore::new(Some(Duration::ZERO)).unwrap();
        store.put("a@b.com", "123456").await;

        let handle = spawn_expiry_sweeper(Arc::new(store.clone()), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert!(store.is_empty().await);
    }

    #[test]
    fn outcomes_map_to_route_errors() {
        assert!(VerifyOutcome::Verified.into_result().is_ok());
        assert!(matches!(
            VerifyOutcome::NotFound.into_result(),
            Err(AppError::OtpNotFound)
        ));
        assert!(matches!(
            VerifyOutcome::Mismatch.into_result(),
            Err(AppError::InvalidOtp)
        ));
    }
}
