use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySql, Pool};

use super::interface::{AuthError, Result, UserRepository};
use super::model::User;

pub struct UserCrud {
    pool: Pool<MySql>,
}

impl UserCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserCrud {
    async fn create(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, email_verified, referred_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.email_verified)
        .bind(&user.referred_by)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                // Duplicate key (MySQL error 1062) means a concurrent signup won
                let err_str = e.to_string();
                if err_str.contains("Duplicate entry") || err_str.contains("1062") {
                    return Err(AuthError::EmailAlreadyExists);
                }
                Err(e.into())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, email_verified, referred_by, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }

    async fn set_email_verified(&self, email: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = ? WHERE email = ?")
            .bind(Utc::now())
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
