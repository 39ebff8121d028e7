use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::interface::{OtpRepository, Result};
use super::model::OtpRecord;

/// Process-local OTP store. Used for tests and single-instance development.
#[derive(Default)]
pub struct InMemoryOtpRepository {
    records: Mutex<Vec<OtpRecord>>,
}

impl InMemoryOtpRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records_for(&self, email: &str) -> Vec<OtpRecord> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.email == email)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OtpRepository for InMemoryOtpRepository {
    async fn create(&self, record: &OtpRecord) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn supersede_unused(&self, email: &str) -> Result<u64> {
        let mut records = self.records.lock().await;
        let mut touched = 0;
        for record in records.iter_mut().filter(|r| r.email == email && !r.used) {
            record.used = true;
            touched += 1;
        }
        Ok(touched)
    }

    async fn find_latest_usable(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|r| r.email == email && r.code == code && r.is_usable_at(now))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn mark_used(&self, id: &str) -> Result<bool> {
        let mut records = self.records.lock().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) if !record.used => {
                record.used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
