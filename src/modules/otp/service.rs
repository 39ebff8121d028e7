use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::interface::{AttemptStore, OtpError, OtpRepository, Result};
use super::model::{OtpPolicy, OtpRecord};
use crate::modules::common::normalize_email;
use crate::services::code_generator::generate_code;

/// Issues and verifies one-time codes.
///
/// Verification consumes a code through the repository's conditional update,
/// so two concurrent attempts with the same valid code cannot both succeed.
/// Every failed verification counts towards the lockout policy.
pub struct OtpService {
    repo: Arc<dyn OtpRepository>,
    attempts: Arc<dyn AttemptStore>,
    policy: OtpPolicy,
}

impl OtpService {
    pub fn new(repo: Arc<dyn OtpRepository>, attempts: Arc<dyn AttemptStore>, policy: OtpPolicy) -> Self {
        Self {
            repo,
            attempts,
            policy,
        }
    }

    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    pub async fn issue(&self, email: &str) -> Result<OtpRecord> {
        self.issue_at(email, Utc::now()).await
    }

    pub async fn issue_at(&self, email: &str, now: DateTime<Utc>) -> Result<OtpRecord> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(OtpError::InvalidEmail);
        }

        self.ensure_not_locked(&email, now).await?;

        let code = generate_code(self.policy.code_length)?;

        let superseded = self.repo.supersede_unused(&email).await?;
        if superseded > 0 {
            tracing::debug!("Superseded {} unused code(s) for {}", superseded, email);
        }

        let record = OtpRecord {
            id: Uuid::new_v4().to_string(),
            email,
            code,
            created_at: now,
            expires_at: now + self.policy.expiration(),
            used: false,
        };

        self.repo.create(&record).await?;
        tracing::info!("Issued verification code for {}", record.email);

        Ok(record)
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<()> {
        self.verify_at(email, code, Utc::now()).await
    }

    pub async fn verify_at(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<()> {
        let email = normalize_email(email);
        let code = code.trim().to_uppercase();

        self.ensure_not_locked(&email, now).await?;

        if code.len() == self.policy.code_length {
            if let Some(record) = self.repo.find_latest_usable(&email, &code, now).await? {
                if self.repo.mark_used(&record.id).await? {
                    self.attempts.clear_failures(&email).await?;
                    tracing::info!("Verified code for {}", email);
                    return Ok(());
                }
            }
        }

        self.register_failure(&email, now).await
    }

    async fn ensure_not_locked(&self, email: &str, now: DateTime<Utc>) -> Result<()> {
        if let Some(until) = self.attempts.locked_until(email, now).await? {
            return Err(OtpError::Locked {
                retry_after_secs: (until - now).num_seconds().max(1),
            });
        }
        Ok(())
    }

    async fn register_failure(&self, email: &str, now: DateTime<Utc>) -> Result<()> {
        if self.policy.max_attempts == 0 {
            return Err(OtpError::InvalidOrExpired);
        }

        let failures = self
            .attempts
            .record_failure(email, self.policy.lockout(), now)
            .await?;

        if failures >= self.policy.max_attempts {
            let until = now + self.policy.lockout();
            self.attempts.lock(email, until, now).await?;
            self.attempts.clear_failures(email).await?;
            tracing::warn!(
                "Locked verification for {} after {} failed attempts",
                email,
                failures
            );
            return Err(OtpError::Locked {
                retry_after_secs: self.policy.lockout_secs,
            });
        }

        Err(OtpError::InvalidOrExpired)
    }
}
