use std::sync::Arc;

use crate::application::admins::AdminService;
use crate::application::applicants::ApplicantService;
use crate::application::catalog::CatalogService;
use crate::application::onboarding::{ServiceProviderOnboardingService, StudentOnboardingService};
use crate::application::profiles::ProfileService;
use crate::application::repos::HealthRepo;
use crate::application::roles::RoleService;
use crate::application::snapshots::SnapshotRefresher;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<CatalogService>,
    pub applicants: Arc<ApplicantService>,
    pub profiles: Arc<ProfileService>,
    pub students: Arc<StudentOnboardingService>,
    pub service_providers: Arc<ServiceProviderOnboardingService>,
    pub admins: Arc<AdminService>,
    pub roles: Arc<RoleService>,
    pub refresher: Arc<SnapshotRefresher>,
    pub health: Arc<dyn HealthRepo>,
    /// Request body ceiling for the identity-document upload route.
    pub upload_body_limit: usize,
}
