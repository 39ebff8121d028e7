use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, Pool};

use super::interface::{OtpRepository, Result};
use super::model::OtpRecord;

pub struct OtpCrud {
    pool: Pool<MySql>,
}

impl OtpCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpRepository for OtpCrud {
    async fn create(&self, record: &OtpRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_codes (id, email, code, created_at, expires_at, used)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.email)
        .bind(&record.code)
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(record.used)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn supersede_unused(&self, email: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE otp_codes SET used = TRUE WHERE email = ? AND used = FALSE")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_latest_usable(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>> {
        let record = sqlx::query_as::<_, OtpRecord>(
            r#"
            SELECT id, email, code, created_at, expires_at, used
            FROM otp_codes
            WHERE email = ? AND code = ? AND used = FALSE AND expires_at > ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn mark_used(&self, id: &str) -> Result<bool> {
        // The used = FALSE guard makes concurrent verifications race on the row,
        // only one of them sees an affected row.
        let result = sqlx::query("UPDATE otp_codes SET used = TRUE WHERE id = ? AND used = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
