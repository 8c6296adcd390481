//! Builds the configured cache backend.

use std::sync::Arc;

use deadpool_redis::{PoolConfig, Runtime};
use tracing::info;

use crate::config::{CacheBackendKind, CacheSettings};

use super::{CacheError, CacheStore, MemoryCacheStore, RedisCacheStore};

const SOURCE: &str = "cache::backend";

/// Opens the cache backend selected by `settings`.
///
/// The Redis backend is probed once so a bad URL fails startup instead of
/// the first request.
pub async fn connect(settings: &CacheSettings) -> Result<Arc<dyn CacheStore>, CacheError> {
    match settings.backend {
        CacheBackendKind::Memory => {
            info!(target = SOURCE, backend = "memory", "snapshot cache ready");
            Ok(Arc::new(MemoryCacheStore::new()))
        }
        CacheBackendKind::Redis => {
            let url = settings.redis_url.as_deref().ok_or_else(|| {
                CacheError::Unavailable("cache.redis_url is not configured".to_string())
            })?;

            let mut pool_config = PoolConfig::new(settings.redis_pool_size.get());
            pool_config.timeouts.wait = Some(settings.redis_timeout);
            pool_config.timeouts.create = Some(settings.redis_timeout);
            pool_config.timeouts.recycle = Some(settings.redis_timeout);

            let mut redis_config = deadpool_redis::Config::from_url(url);
            redis_config.pool = Some(pool_config);

            let pool = redis_config
                .create_pool(Some(Runtime::Tokio1))
                .map_err(|err| CacheError::Unavailable(err.to_string()))?;

            pool.get()
                .await
                .map_err(|err| CacheError::Unavailable(err.to_string()))?;

            info!(
                target = SOURCE,
                backend = "redis",
                pool_size = settings.redis_pool_size.get(),
                "snapshot cache ready"
            );
            Ok(Arc::new(RedisCacheStore::new(pool, settings.redis_timeout)))
        }
    }
}
