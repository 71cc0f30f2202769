use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub code: String,                      // 6-digit OTP
    pub issued_at: DateTime<Utc>,          // When OTP was created
    pub expires_at: Option<DateTime<Utc>>, // None = never expires
}

impl OtpRecord {
    pub fn new(code: impl Into<String>, issued_at: DateTime<Utc>, ttl: Option<chrono::Duration>) -> Self {
        Self {
            code: code.into(),
            issued_at,
            expires_at: ttl.map(|ttl| issued_at + ttl),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}
