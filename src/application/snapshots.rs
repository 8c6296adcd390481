//! Cache-aside snapshots of account profiles.
//!
//! Reads consult the cache first and fall back to canonical storage on a miss.
//! Writes never touch the cache directly: a committed mutation returns a
//! [`Committed`] value, and its payload is only released by
//! [`Committed::publish`], which refreshes every touched snapshot.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::cache::{CacheError, CacheStore, SnapshotKey};
use crate::domain::entities::{AdminProfile, ServiceProviderProfile, StudentProfile};
use crate::domain::types::EntityKind;

const SOURCE: &str = "application::snapshots";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("{0} not found")]
    NotFound(EntityKind),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A joined representation stored in the cache.
pub trait Snapshot: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;
}

impl Snapshot for StudentProfile {
    const KIND: EntityKind = EntityKind::Student;
}

impl Snapshot for ServiceProviderProfile {
    const KIND: EntityKind = EntityKind::ServiceProvider;
}

impl Snapshot for AdminProfile {
    const KIND: EntityKind = EntityKind::Admin;
}

/// Canonical read producing a snapshot with all declared relations.
#[async_trait]
pub trait SnapshotSource<T: Send>: Send + Sync {
    async fn load_snapshot(&self, user_id: Uuid) -> Result<Option<T>, RepoError>;
}

pub struct CacheAsideRepository<T: Snapshot> {
    source: Arc<dyn SnapshotSource<T>>,
    cache: Arc<dyn CacheStore>,
    _snapshot: PhantomData<fn() -> T>,
}

impl<T: Snapshot> Clone for CacheAsideRepository<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            cache: self.cache.clone(),
            _snapshot: PhantomData,
        }
    }
}

impl<T: Snapshot> CacheAsideRepository<T> {
    pub fn new(source: Arc<dyn SnapshotSource<T>>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            source,
            cache,
            _snapshot: PhantomData,
        }
    }

    fn key(user_id: Uuid) -> String {
        SnapshotKey::new(T::KIND, user_id).to_string()
    }

    /// Returns the cached snapshot if present, otherwise the canonical record.
    ///
    /// A miss does not populate the cache.
    pub async fn get_by_id(&self, user_id: Uuid) -> Result<T, SnapshotError> {
        if let Some(snapshot) = self.cached(user_id).await? {
            return Ok(snapshot);
        }

        self.get_uncached(user_id).await
    }

    /// Reads canonical storage, bypassing the cache entirely.
    pub async fn get_uncached(&self, user_id: Uuid) -> Result<T, SnapshotError> {
        self.source
            .load_snapshot(user_id)
            .await?
            .ok_or(SnapshotError::NotFound(T::KIND))
    }

    /// Like [`get_by_id`](Self::get_by_id), but warms the cache on a miss.
    pub async fn get_or_warm(&self, user_id: Uuid) -> Result<T, SnapshotError> {
        if let Some(snapshot) = self.cached(user_id).await? {
            return Ok(snapshot);
        }

        let snapshot = self
            .source
            .load_snapshot(user_id)
            .await?
            .ok_or(SnapshotError::NotFound(T::KIND))?;
        self.write(user_id, &snapshot).await?;
        Ok(snapshot)
    }

    /// Re-reads canonical storage and overwrites the cache entry.
    ///
    /// A record that no longer exists leaves the cache untouched.
    pub async fn refresh_cache(&self, user_id: Uuid) -> Result<(), SnapshotError> {
        match self.source.load_snapshot(user_id).await? {
            Some(snapshot) => self.write(user_id, &snapshot).await,
            None => {
                debug!(
                    target = SOURCE,
                    kind = %T::KIND,
                    %user_id,
                    "refresh skipped; record not found"
                );
                Ok(())
            }
        }
    }

    async fn cached(&self, user_id: Uuid) -> Result<Option<T>, SnapshotError> {
        let key = Self::key(user_id);
        let Some(raw) = self.cache.get(&key).await? else {
            counter!("talentdesk_cache_miss_total", "kind" => T::KIND.as_str()).increment(1);
            return Ok(None);
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(snapshot) => {
                counter!("talentdesk_cache_hit_total", "kind" => T::KIND.as_str()).increment(1);
                Ok(Some(snapshot))
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    %key,
                    error = %err,
                    "discarding undecodable snapshot"
                );
                counter!("talentdesk_cache_miss_total", "kind" => T::KIND.as_str()).increment(1);
                Ok(None)
            }
        }
    }

    async fn write(&self, user_id: Uuid, snapshot: &T) -> Result<(), SnapshotError> {
        let encoded = serde_json::to_string(snapshot)?;
        self.cache.set(&Self::key(user_id), encoded).await?;
        counter!("talentdesk_cache_refresh_total", "kind" => T::KIND.as_str()).increment(1);
        Ok(())
    }
}

/// A snapshot touched by a committed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub user_id: Uuid,
}

impl EntityRef {
    pub fn student(user_id: Uuid) -> Self {
        Self {
            kind: EntityKind::Student,
            user_id,
        }
    }

    pub fn service_provider(user_id: Uuid) -> Self {
        Self {
            kind: EntityKind::ServiceProvider,
            user_id,
        }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self {
            kind: EntityKind::Admin,
            user_id,
        }
    }
}

/// Routes refresh requests to the repository owning each entity kind.
#[derive(Clone)]
pub struct SnapshotRefresher {
    pub students: CacheAsideRepository<StudentProfile>,
    pub service_providers: CacheAsideRepository<ServiceProviderProfile>,
    pub admins: CacheAsideRepository<AdminProfile>,
}

impl SnapshotRefresher {
    pub async fn refresh(&self, entity: EntityRef) -> Result<(), SnapshotError> {
        match entity.kind {
            EntityKind::Student => self.students.refresh_cache(entity.user_id).await,
            EntityKind::ServiceProvider => {
                self.service_providers.refresh_cache(entity.user_id).await
            }
            EntityKind::Admin => self.admins.refresh_cache(entity.user_id).await,
        }
    }
}

/// Result of a write whose transaction has committed.
///
/// Only produced after a successful commit, so a rolled-back mutation has
/// nothing to publish.
#[must_use = "committed writes must be published to refresh cached snapshots"]
#[derive(Debug)]
pub struct Committed<T> {
    value: T,
    touched: Vec<EntityRef>,
}

impl<T> Committed<T> {
    pub fn new(value: T, touched: Vec<EntityRef>) -> Self {
        Self { value, touched }
    }

    pub fn touched(&self) -> &[EntityRef] {
        &self.touched
    }

    #[cfg(test)]
    pub(crate) fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Committed<U> {
        Committed {
            value: f(self.value),
            touched: self.touched,
        }
    }

    /// Refreshes every touched snapshot, then yields the value.
    ///
    /// The first failed refresh is returned; the canonical write stays
    /// committed and the stale snapshot is replaced by the next mutation.
    pub async fn publish(self, refresher: &SnapshotRefresher) -> Result<T, SnapshotError> {
        for entity in &self.touched {
            if let Err(err) = refresher.refresh(*entity).await {
                warn!(
                    target = SOURCE,
                    kind = %entity.kind,
                    user_id = %entity.user_id,
                    error = %err,
                    "snapshot refresh failed after commit"
                );
                return Err(err);
            }
        }
        Ok(self.value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use time::OffsetDateTime;

    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::domain::entities::{AdminRecord, UserSummary};

    #[derive(Default)]
    struct StubAdmins {
        rows: Mutex<HashMap<Uuid, AdminProfile>>,
        loads: AtomicUsize,
    }

    impl StubAdmins {
        fn insert(&self, profile: AdminProfile) {
            self.rows
                .lock()
                .expect("rows lock")
                .insert(profile.admin.user_id, profile);
        }

        fn rename(&self, user_id: Uuid, first_name: &str) {
            if let Some(profile) = self.rows.lock().expect("rows lock").get_mut(&user_id) {
                profile.user.first_name = first_name.to_string();
            }
        }
    }

    #[async_trait]
    impl SnapshotSource<AdminProfile> for StubAdmins {
        async fn load_snapshot(&self, user_id: Uuid) -> Result<Option<AdminProfile>, RepoError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().expect("rows lock").get(&user_id).cloned())
        }
    }

    struct EmptySource;

    #[async_trait]
    impl<T: Send + 'static> SnapshotSource<T> for EmptySource {
        async fn load_snapshot(&self, _user_id: Uuid) -> Result<Option<T>, RepoError> {
            Ok(None)
        }
    }

    fn admin(user_id: Uuid) -> AdminProfile {
        let now = OffsetDateTime::UNIX_EPOCH;
        AdminProfile {
            admin: AdminRecord {
                id: Uuid::new_v4(),
                user_id,
                deleted: false,
                created_at: now,
                updated_at: now,
            },
            user: UserSummary {
                id: user_id,
                first_name: "Ada".into(),
                last_name: "Obi".into(),
                email: "ada@example.com".into(),
                field: None,
                level: None,
                is_email_verified: true,
                is_agreement_accepted: true,
                need_email_notification: true,
                created_at: now,
                updated_at: now,
            },
            information: None,
            roles: Vec::new(),
        }
    }

    fn repository(
        source: Arc<StubAdmins>,
        cache: Arc<MemoryCacheStore>,
    ) -> CacheAsideRepository<AdminProfile> {
        CacheAsideRepository::new(source, cache)
    }

    fn refresher(
        admins: CacheAsideRepository<AdminProfile>,
        cache: Arc<MemoryCacheStore>,
    ) -> SnapshotRefresher {
        SnapshotRefresher {
            students: CacheAsideRepository::new(Arc::new(EmptySource), cache.clone()),
            service_providers: CacheAsideRepository::new(Arc::new(EmptySource), cache),
            admins,
        }
    }

    #[tokio::test]
    async fn miss_reads_canonical_without_populating() {
        let source = Arc::new(StubAdmins::default());
        let cache = Arc::new(MemoryCacheStore::new());
        let user_id = Uuid::new_v4();
        source.insert(admin(user_id));
        let repo = repository(source.clone(), cache.clone());

        let profile = repo.get_by_id(user_id).await.expect("profile");

        assert_eq!(profile.user.first_name, "Ada");
        assert!(cache.is_empty());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hit_skips_canonical_read() {
        let source = Arc::new(StubAdmins::default());
        let cache = Arc::new(MemoryCacheStore::new());
        let user_id = Uuid::new_v4();
        source.insert(admin(user_id));
        let repo = repository(source.clone(), cache.clone());

        repo.refresh_cache(user_id).await.expect("refresh");
        let loads_after_refresh = source.loads.load(Ordering::SeqCst);

        let profile = repo.get_by_id(user_id).await.expect("profile");
        assert_eq!(profile, admin_with_same_ids(&profile));
        assert_eq!(source.loads.load(Ordering::SeqCst), loads_after_refresh);
    }

    fn admin_with_same_ids(profile: &AdminProfile) -> AdminProfile {
        let mut expected = admin(profile.admin.user_id);
        expected.admin.id = profile.admin.id;
        expected
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let repo = repository(
            Arc::new(StubAdmins::default()),
            Arc::new(MemoryCacheStore::new()),
        );

        let err = repo.get_by_id(Uuid::new_v4()).await.expect_err("missing");
        assert!(matches!(err, SnapshotError::NotFound(EntityKind::Admin)));
    }

    #[tokio::test]
    async fn refresh_of_missing_record_is_a_noop() {
        let cache = Arc::new(MemoryCacheStore::new());
        let repo = repository(Arc::new(StubAdmins::default()), cache.clone());

        repo.refresh_cache(Uuid::new_v4()).await.expect("no-op refresh");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn refresh_is_idempotent_and_matches_canonical() {
        let source = Arc::new(StubAdmins::default());
        let cache = Arc::new(MemoryCacheStore::new());
        let user_id = Uuid::new_v4();
        source.insert(admin(user_id));
        let repo = repository(source.clone(), cache.clone());
        let key = SnapshotKey::new(EntityKind::Admin, user_id).to_string();

        repo.refresh_cache(user_id).await.expect("first refresh");
        let first = cache.get(&key).await.expect("get");
        repo.refresh_cache(user_id).await.expect("second refresh");
        let second = cache.get(&key).await.expect("get");

        assert!(first.is_some());
        assert_eq!(first, second);

        let canonical = source
            .load_snapshot(user_id)
            .await
            .expect("load")
            .expect("present");
        assert_eq!(repo.get_by_id(user_id).await.expect("cached"), canonical);
    }

    #[tokio::test]
    async fn corrupt_entry_falls_back_to_canonical() {
        let source = Arc::new(StubAdmins::default());
        let cache = Arc::new(MemoryCacheStore::new());
        let user_id = Uuid::new_v4();
        source.insert(admin(user_id));
        let key = SnapshotKey::new(EntityKind::Admin, user_id).to_string();
        cache.set(&key, "not json".into()).await.expect("set");
        let repo = repository(source, cache);

        let profile = repo.get_by_id(user_id).await.expect("profile");
        assert_eq!(profile.admin.user_id, user_id);
    }

    #[tokio::test]
    async fn get_or_warm_populates_on_miss() {
        let source = Arc::new(StubAdmins::default());
        let cache = Arc::new(MemoryCacheStore::new());
        let user_id = Uuid::new_v4();
        source.insert(admin(user_id));
        let repo = repository(source, cache.clone());

        repo.get_or_warm(user_id).await.expect("warm");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn publish_refreshes_touched_snapshots() {
        let source = Arc::new(StubAdmins::default());
        let cache = Arc::new(MemoryCacheStore::new());
        let user_id = Uuid::new_v4();
        source.insert(admin(user_id));
        let repo = repository(source.clone(), cache.clone());
        repo.refresh_cache(user_id).await.expect("warm");

        source.rename(user_id, "Adaeze");
        let stale = repo.get_by_id(user_id).await.expect("stale read");
        assert_eq!(stale.user.first_name, "Ada");

        let committed = Committed::new(7_u32, vec![EntityRef::admin(user_id)]);
        let value = committed
            .publish(&refresher(repo.clone(), cache))
            .await
            .expect("publish");

        assert_eq!(value, 7);
        let fresh = repo.get_by_id(user_id).await.expect("fresh read");
        assert_eq!(fresh.user.first_name, "Adaeze");
    }

    #[tokio::test]
    async fn publish_surfaces_cache_failures() {
        let source = Arc::new(StubAdmins::default());
        let cache = Arc::new(MemoryCacheStore::new());
        let user_id = Uuid::new_v4();
        source.insert(admin(user_id));
        let repo = repository(source, cache.clone());
        cache.close().await;

        let err = Committed::new((), vec![EntityRef::admin(user_id)])
            .publish(&refresher(repo, cache))
            .await
            .expect_err("closed cache");

        assert!(matches!(err, SnapshotError::Cache(CacheError::Unavailable(_))));
    }

    #[test]
    fn map_keeps_touched_entities() {
        let user_id = Uuid::new_v4();
        let committed = Committed::new(2, vec![EntityRef::student(user_id)]).map(|v| v * 3);
        assert_eq!(committed.touched(), &[EntityRef::student(user_id)]);
        drop(committed);
    }
}
