use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::{CacheError, CacheStore};

const SOURCE: &str = "cache::memory";

/// Process-local snapshot cache.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, String>,
    closed: AtomicBool,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Unavailable("memory cache closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.ensure_open()?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.ensure_open()?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.ensure_open()?;
        self.entries.remove(key);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.entries.clear();
        debug!(target = SOURCE, "memory cache closed");
    }
}
