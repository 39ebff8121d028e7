use redis::{AsyncCommands, Client, Pipeline, RedisResult};

/// Thin wrapper around a Redis client.
/// Opens a multiplexed connection per call; the client itself is cheap to clone.
#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    pub fn new(redis_url: &str) -> RedisResult<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self { client })
    }

    pub async fn get_string(&self, key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.get(key).await
    }

    pub async fn set_string(&self, key: &str, value: &str, ttl_secs: u64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    /// Increment a counter, setting `ttl_secs` when the key is first created.
    pub async fn incr_with_ttl(&self, key: &str, ttl_secs: u64) -> RedisResult<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let (count,): (i64,) = incr_with_ttl_pipeline(key, ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }

    pub async fn delete(&self, key: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

// INCR and EXPIRE in one MULTI/EXEC. EXPIRE NX (Redis 7+) keeps the window
// fixed from the first failure.
fn incr_with_ttl_pipeline(key: &str, ttl_secs: u64) -> Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1)
        .cmd("EXPIRE")
        .arg(key)
        .arg(ttl_secs)
        .arg("NX")
        .ignore();
    pipe
}
