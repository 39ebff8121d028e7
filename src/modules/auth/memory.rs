use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::interface::{AuthError, Result, UserRepository};
use super::model::User;

/// Process-local account store keyed by email.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(AuthError::EmailAlreadyExists);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.users.read().await.contains_key(email))
    }

    async fn set_email_verified(&self, email: &str) -> Result<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(email) {
            Some(user) => {
                user.email_verified = true;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
