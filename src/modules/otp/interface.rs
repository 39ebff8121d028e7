use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};

use super::model::OtpRecord;
use crate::modules::common::ErrorResponse;
use crate::services::code_generator::GenerationError;

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

pub type Result<T> = std::result::Result<T, OtpError>;

#[async_trait]
pub trait OtpRepository: Send + Sync {
    async fn create(&self, record: &OtpRecord) -> Result<()>;

    /// Mark every unused code for `email` as used. Returns the number of rows touched.
    async fn supersede_unused(&self, email: &str) -> Result<u64>;

    /// Most recently created record matching email and code that is unused
    /// and not expired at `now`.
    async fn find_latest_usable(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>>;

    /// Conditional `used = false -> true` transition.
    /// Returns false when another caller consumed the record first.
    async fn mark_used(&self, id: &str) -> Result<bool>;
}

/// Failed-attempt counters and lockouts, keyed by normalized email.
/// Entries expire on their own; nothing here needs sweeping.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn locked_until(&self, key: &str, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>>;

    /// Count a failure. The counter lives for `window` after the first failure.
    async fn record_failure(&self, key: &str, window: Duration, now: DateTime<Utc>) -> Result<u32>;

    async fn lock(&self, key: &str, until: DateTime<Utc>, now: DateTime<Utc>) -> Result<()>;

    async fn clear_failures(&self, key: &str) -> Result<()>;
}

// =============================================================================
// DELIVERY
// =============================================================================

#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(
        &self,
        email: &str,
        code: &str,
        expires_in_secs: i64,
    ) -> std::result::Result<(), DeliveryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Delivery request failed: {0}")]
    Http(String),

    #[error("Delivery service rejected the message with status {0}")]
    Rejected(u16),
}

impl IntoResponse for DeliveryError {
    fn into_response(self) -> Response {
        tracing::error!("OTP delivery failed: {}", self);
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::with_message(
                "delivery_failed",
                "Could not send the verification code, please try again",
            )),
        )
            .into_response()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    /// Wrong code, already used, expired or never issued. Deliberately not
    /// distinguished.
    #[error("Invalid or expired code")]
    InvalidOrExpired,

    #[error("Too many failed attempts")]
    Locked { retry_after_secs: i64 },

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Code generation failed: {0}")]
    Generation(String),
}

impl From<sqlx::Error> for OtpError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<redis::RedisError> for OtpError {
    fn from(e: redis::RedisError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<GenerationError> for OtpError {
    fn from(e: GenerationError) -> Self {
        Self::Generation(e.to_string())
    }
}

impl OtpError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidOrExpired => StatusCode::BAD_REQUEST,
            Self::Locked { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidEmail => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidOrExpired => "invalid_or_expired",
            Self::Locked { .. } => "too_many_attempts",
            Self::InvalidEmail => "invalid_email",
            Self::Storage(_) | Self::Generation(_) => "internal_error",
        }
    }
}

impl IntoResponse for OtpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Storage(_) | Self::Generation(_) => {
                // Details stay in the logs
                tracing::error!("OTP workflow failure: {}", self);
                ErrorResponse::with_message(self.error_code(), "Something went wrong")
            }
            Self::Locked { retry_after_secs } => ErrorResponse::with_message(
                self.error_code(),
                format!("Too many failed attempts, try again in {} seconds", retry_after_secs),
            ),
            _ => ErrorResponse::with_message(self.error_code(), self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
