//! Snapshot cache collaborators.
//!
//! The cache holds opaque JSON snapshots keyed by `"{prefix}-{user_id}"`.
//! It is advisory: canonical storage stays the source of truth and only
//! the owning cache-aside repository writes entries.
//!
//! Two backends are provided:
//!
//! - [`MemoryCacheStore`]: process-local, backed by `DashMap`
//! - [`RedisCacheStore`]: shared across instances via a `deadpool-redis` pool

mod backend;
mod memory;
mod redis_store;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::types::EntityKind;

pub use backend::connect;
pub use memory::MemoryCacheStore;
pub use redis_store::RedisCacheStore;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("cache backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Overwrites the entry unconditionally. Entries carry no TTL.
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Releases backend resources. Later calls may fail with `Unavailable`.
    async fn close(&self);
}

/// Identifies one cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub kind: EntityKind,
    pub user_id: Uuid,
}

impl SnapshotKey {
    pub fn new(kind: EntityKind, user_id: Uuid) -> Self {
        Self { kind, user_id }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.cache_prefix(), self.user_id)
    }
}
