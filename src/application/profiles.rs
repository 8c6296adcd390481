//! Single-account reads served through the snapshot cache.

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::application::snapshots::{CacheAsideRepository, Snapshot, SnapshotError};
use crate::domain::entities::{AdminProfile, ServiceProviderProfile, StudentProfile};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

#[derive(Clone)]
pub struct ProfileService {
    students: CacheAsideRepository<StudentProfile>,
    service_providers: CacheAsideRepository<ServiceProviderProfile>,
    admins: CacheAsideRepository<AdminProfile>,
}

impl ProfileService {
    pub fn new(
        students: CacheAsideRepository<StudentProfile>,
        service_providers: CacheAsideRepository<ServiceProviderProfile>,
        admins: CacheAsideRepository<AdminProfile>,
    ) -> Self {
        Self {
            students,
            service_providers,
            admins,
        }
    }

    pub async fn student(&self, user_id: Uuid) -> Result<StudentProfile, ProfileError> {
        read_through(&self.students, user_id).await
    }

    pub async fn service_provider(
        &self,
        user_id: Uuid,
    ) -> Result<ServiceProviderProfile, ProfileError> {
        read_through(&self.service_providers, user_id).await
    }

    pub async fn admin(&self, user_id: Uuid) -> Result<AdminProfile, ProfileError> {
        read_through(&self.admins, user_id).await
    }
}

/// Serves from the cache and warms it on a miss.
///
/// A cache outage degrades to a canonical read instead of failing the request.
async fn read_through<T: Snapshot>(
    repo: &CacheAsideRepository<T>,
    user_id: Uuid,
) -> Result<T, ProfileError> {
    match repo.get_or_warm(user_id).await {
        Ok(profile) => Ok(profile),
        Err(SnapshotError::Cache(err)) => {
            warn!(
                target = "application::profiles",
                kind = %T::KIND,
                %user_id,
                error = %err,
                "snapshot cache unavailable; serving canonical read"
            );
            repo.get_uncached(user_id).await.map_err(ProfileError::from)
        }
        Err(err) => Err(err.into()),
    }
}
