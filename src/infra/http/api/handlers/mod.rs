//! API handlers organized by resource.
//!
//! Error conversions shared across resources live here. Every mutating
//! handler publishes its committed result before responding, so the
//! response never races a stale snapshot.

mod admins;
mod applicants;
mod catalog;
mod profiles;
mod roles;
mod service_providers;
mod students;

pub use admins::*;
pub use applicants::*;
pub use catalog::*;
pub use profiles::*;
pub use roles::*;
pub use service_providers::*;
pub use students::*;

use crate::application::admins::AdminError;
use crate::application::listing::ListingError;
use crate::application::onboarding::OnboardingError;
use crate::application::profiles::ProfileError;
use crate::application::repos::RepoError;
use crate::application::snapshots::SnapshotError;

use super::error::ApiError;

fn repo_to_api(err: RepoError) -> ApiError {
    ApiError::from_error("infra::http::api::catalog", err.kind(), &err)
}

fn listing_to_api(err: ListingError) -> ApiError {
    let api = ApiError::from_error("infra::http::api::listing", err.kind(), &err);
    match err {
        ListingError::Pagination(_) => {
            api.with_hint("pageSize and currentPage must be positive integers")
        }
        _ => api,
    }
}

fn profile_to_api(err: ProfileError) -> ApiError {
    ApiError::from_error("infra::http::api::profiles", err.kind(), &err)
}

fn onboarding_to_api(err: OnboardingError) -> ApiError {
    ApiError::from_error("infra::http::api::onboarding", err.kind(), &err)
}

fn admin_to_api(err: AdminError) -> ApiError {
    ApiError::from_error("infra::http::api::admins", err.kind(), &err)
}

/// The write committed but its snapshot could not be refreshed.
fn publish_to_api(err: SnapshotError) -> ApiError {
    ApiError::from_error("infra::http::api::publish", err.kind(), &err)
}
