use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Records older than this are treated as absent by every reader.
pub const REFERRAL_MAX_AGE_MS: i64 = 30 * 24 * 60 * 60 * 1000;

pub const DEFAULT_SOURCE: &str = "url_parameter";

/// HTTP-only cookie written by the server.
pub const SERVER_COOKIE: &str = "consultant_referral";

/// Script-visible cookie mirrored by the browser store.
pub const MIRROR_COOKIE: &str = "consultant_ref";

/// Local storage key used by the browser store.
pub const LOCAL_STORAGE_KEY: &str = "consultant_referral";

pub const REF_PARAM: &str = "ref";

lazy_static! {
    static ref CONSULTANT_CODE: Regex = Regex::new(r"^[A-Z0-9_-]{1,32}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub code: String,
    /// Capture time, epoch milliseconds
    pub timestamp: i64,
    pub source: String,
}

impl TrackingRecord {
    pub fn new(code: &str, source: Option<&str>, now_ms: i64) -> Self {
        Self {
            code: normalize_code(code),
            timestamp: now_ms,
            source: source.unwrap_or(DEFAULT_SOURCE).to_string(),
        }
    }

    /// Malformed input, or a code that is not a consultant code, is treated
    /// as no record at all.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut record: Self = serde_json::from_str(raw).ok()?;
        record.code = normalize_code(&record.code);
        is_valid_code(&record.code).then_some(record)
    }

    /// Records stamped in the future never count as fresh.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        match now_ms.checked_sub(self.timestamp) {
            Some(age) => age < 0 || age > REFERRAL_MAX_AGE_MS,
            None => true,
        }
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Accepts an already-normalized consultant code.
pub fn is_valid_code(code: &str) -> bool {
    CONSULTANT_CODE.is_match(code)
}
