use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::interface::{AttemptStore, Result};
use crate::services::redis_cache::RedisService;

fn failures_key(key: &str) -> String {
    format!("otp:failures:{}", key)
}

fn lock_key(key: &str) -> String {
    format!("otp:lock:{}", key)
}

// =============================================================================
// REDIS
// =============================================================================

/// Attempt tracking shared by every instance pointing at the same Redis.
pub struct RedisAttemptStore {
    redis: RedisService,
}

impl RedisAttemptStore {
    pub fn new(redis: RedisService) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl AttemptStore for RedisAttemptStore {
    async fn locked_until(&self, key: &str, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let raw = self.redis.get_string(&lock_key(key)).await?;

        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .filter(|until| *until > now))
    }

    async fn record_failure(&self, key: &str, window: Duration, _now: DateTime<Utc>) -> Result<u32> {
        let ttl = window.num_seconds().max(1) as u64;
        let count = self.redis.incr_with_ttl(&failures_key(key), ttl).await?;
        Ok(count.max(0) as u32)
    }

    async fn lock(&self, key: &str, until: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        let ttl = (until - now).num_seconds().max(1) as u64;
        self.redis
            .set_string(&lock_key(key), &until.to_rfc3339(), ttl)
            .await?;
        Ok(())
    }

    async fn clear_failures(&self, key: &str) -> Result<()> {
        self.redis.delete(&failures_key(key)).await?;
        Ok(())
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    count: u32,
    expires_at: DateTime<Utc>,
}

/// Per-process attempt tracking. State is lost on restart and not shared
/// between instances.
#[derive(Default)]
pub struct InMemoryAttemptStore {
    failures: Mutex<HashMap<String, FailureWindow>>,
    locks: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn locked_until(&self, key: &str, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let mut locks = self.locks.lock().await;
        match locks.get(key).copied() {
            Some(until) if until > now => Ok(Some(until)),
            Some(_) => {
                locks.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn record_failure(&self, key: &str, window: Duration, now: DateTime<Utc>) -> Result<u32> {
        let mut failures = self.failures.lock().await;
        let entry = failures.entry(key.to_string()).or_insert(FailureWindow {
            count: 0,
            expires_at: now + window,
        });

        if entry.expires_at <= now {
            *entry = FailureWindow {
                count: 0,
                expires_at: now + window,
            };
        }

        entry.count += 1;
        Ok(entry.count)
    }

    async fn lock(&self, key: &str, until: DateTime<Utc>, _now: DateTime<Utc>) -> Result<()> {
        self.locks.lock().await.insert(key.to_string(), until);
        Ok(())
    }

    async fn clear_failures(&self, key: &str) -> Result<()> {
        self.failures.lock().await.remove(key);
        Ok(())
    }
}
