//! Redis-backed cache store

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::info;

use super::store::CacheStore;
use crate::error::CacheStoreError;

/// Cache store shared across service replicas through Redis
///
/// Writes use `SET .. EX` so a value and its expiry land atomically; deletes
/// use `UNLINK`.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379/0`)
    pub async fn connect(url: &str) -> Result<Self, CacheStoreError> {
        let client = redis::Client::open(url).map_err(backend)?;
        let conn = ConnectionManager::new(client).await.map_err(backend)?;

        info!("Connected Redis cache store");
        Ok(Self { conn })
    }

    /// Wrap an existing connection manager
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

fn backend(err: redis::RedisError) -> CacheStoreError {
    CacheStoreError::backend(err.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(backend)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheStoreError> {
        let mut conn = self.conn.clone();
        // EX 0 is rejected by Redis
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(backend)
    }

    async fn unlink(&self, keys: &[String]) -> Result<u64, CacheStoreError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        let removed: u64 = conn.unlink(keys).await.map_err(backend)?;
        Ok(removed)
    }
}
