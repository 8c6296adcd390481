use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Connection, Pool};
use redis::AsyncCommands;
use tracing::{debug, warn};

use super::{CacheError, CacheStore};

const SOURCE: &str = "cache::redis";

/// Snapshot cache shared across instances through Redis.
pub struct RedisCacheStore {
    pool: Pool,
    timeout: Duration,
}

impl RedisCacheStore {
    pub fn new(pool: Pool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn connection(&self) -> Result<Connection, CacheError> {
        self.pool.get().await.map_err(|err| {
            warn!(target = SOURCE, error = %err, "failed to get Redis connection");
            CacheError::Unavailable(err.to_string())
        })
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(target = SOURCE, op, timeout = ?self.timeout, "Redis operation timed out");
                Err(CacheError::Timeout(self.timeout))
            }
        }
    }
}

fn backend_error(op: &'static str, key: &str, err: redis::RedisError) -> CacheError {
    warn!(target = SOURCE, op, key, error = %err, "Redis command failed");
    CacheError::Backend(err.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.bounded("get", async {
            let mut conn = self.connection().await?;
            conn.get::<_, Option<String>>(key)
                .await
                .map_err(|err| backend_error("get", key, err))
        })
        .await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.bounded("set", async {
            let mut conn = self.connection().await?;
            conn.set::<_, _, ()>(key, value)
                .await
                .map_err(|err| backend_error("set", key, err))?;
            debug!(target = SOURCE, key, "snapshot written");
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.bounded("delete", async {
            let mut conn = self.connection().await?;
            conn.del::<_, ()>(key)
                .await
                .map_err(|err| backend_error("delete", key, err))
        })
        .await
    }

    async fn close(&self) {
        self.pool.close();
        debug!(target = SOURCE, "Redis pool closed");
    }
}
