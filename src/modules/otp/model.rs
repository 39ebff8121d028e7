use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct OtpRecord {
    pub id: String,
    pub email: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl OtpRecord {
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}

/// Issuance and verification limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    pub code_length: usize,
    pub expiration_secs: i64,
    pub max_attempts: u32,
    pub lockout_secs: i64,
}

impl OtpPolicy {
    pub fn expiration(&self) -> Duration {
        Duration::seconds(self.expiration_secs)
    }

    pub fn lockout(&self) -> Duration {
        Duration::seconds(self.lockout_secs)
    }
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            code_length: 8,
            expiration_secs: 5 * 60,
            max_attempts: 3,
            lockout_secs: 30 * 60,
        }
    }
}
