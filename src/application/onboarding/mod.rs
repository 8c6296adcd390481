//! Onboarding workflows for students and service providers.
//!
//! Every step checks existence against canonical storage, delegates the
//! mutation to a write repository (one serializable transaction per call)
//! and hands back a [`Committed`](crate::application::snapshots::Committed)
//! value that the caller publishes to refresh the owner's snapshot.

pub mod service_provider;
pub mod student;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{
    CatalogRepo, NewEducation, NewWorkExperience, ProfessionalOverviewParams, RepoError,
};
use crate::application::snapshots::SnapshotError;
use crate::application::uploads::UploadError;

pub use service_provider::ServiceProviderOnboardingService;
pub use student::{IdentityDocumentsUpload, StudentOnboardingService};

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl OnboardingError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Names the missing entity when a repository reports `NotFound`.
    fn not_found_as(entity: &'static str) -> impl FnOnce(RepoError) -> Self {
        move |err| match err {
            RepoError::NotFound => Self::NotFound(entity),
            other => Self::Repo(other),
        }
    }
}

/// Deduplicates `skill_ids` and checks every one exists in the catalog.
async fn checked_skills(
    catalog: &Arc<dyn CatalogRepo>,
    skill_ids: &[Uuid],
) -> Result<Vec<Uuid>, OnboardingError> {
    if skill_ids.is_empty() {
        return Err(OnboardingError::invalid("at least one skill is required"));
    }

    let mut unique = skill_ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let missing = catalog.missing_skills(&unique).await?;
    if !missing.is_empty() {
        return Err(OnboardingError::NotFound("skill"));
    }
    Ok(unique)
}

fn checked_education(params: NewEducation) -> Result<NewEducation, OnboardingError> {
    let institution = required("institution", params.institution)?;
    let degree = required("degree", params.degree)?;
    if let Some(end_date) = params.end_date
        && end_date < params.start_date
    {
        return Err(OnboardingError::invalid(
            "education end date must not be before its start date",
        ));
    }

    Ok(NewEducation {
        institution,
        degree,
        field_of_study: optional(params.field_of_study),
        start_date: params.start_date,
        end_date: params.end_date,
    })
}

fn checked_work_experience(
    params: NewWorkExperience,
) -> Result<NewWorkExperience, OnboardingError> {
    let company = required("company", params.company)?;
    let title = required("title", params.title)?;

    let end_date = if params.working_here {
        None
    } else {
        params.end_date
    };
    if let Some(end_date) = end_date
        && end_date < params.start_date
    {
        return Err(OnboardingError::invalid(
            "work experience end date must not be before its start date",
        ));
    }

    Ok(NewWorkExperience {
        company,
        title,
        employment_type: params.employment_type,
        location: optional(params.location),
        start_date: params.start_date,
        end_date,
        working_here: params.working_here,
        description: optional(params.description),
    })
}

fn checked_overview(
    params: ProfessionalOverviewParams,
) -> Result<ProfessionalOverviewParams, OnboardingError> {
    let params = ProfessionalOverviewParams {
        phone_number: optional(params.phone_number),
        address: optional(params.address),
        city: optional(params.city),
        state: optional(params.state),
        country: optional(params.country),
    };

    let empty = params.phone_number.is_none()
        && params.address.is_none()
        && params.city.is_none()
        && params.state.is_none()
        && params.country.is_none();
    if empty {
        return Err(OnboardingError::invalid(
            "personal data must include at least one field",
        ));
    }
    Ok(params)
}

fn required(field: &str, value: String) -> Result<String, OnboardingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OnboardingError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::domain::types::EmploymentType;

    fn work(working_here: bool, end_date: Option<time::Date>) -> NewWorkExperience {
        NewWorkExperience {
            company: " Acme ".into(),
            title: "Engineer".into(),
            employment_type: EmploymentType::FullTime,
            location: Some("  ".into()),
            start_date: date!(2022 - 01 - 01),
            end_date,
            working_here,
            description: None,
        }
    }

    #[test]
    fn working_here_clears_end_date() {
        let checked = checked_work_experience(work(true, Some(date!(2021 - 01 - 01))))
            .expect("valid");

        assert_eq!(checked.end_date, None);
        assert_eq!(checked.company, "Acme");
        assert_eq!(checked.location, None);
    }

    #[test]
    fn work_end_before_start_is_rejected() {
        let err = checked_work_experience(work(false, Some(date!(2021 - 12 - 31))))
            .expect_err("invalid dates");
        assert!(matches!(err, OnboardingError::InvalidArgument(_)));
    }

    #[test]
    fn education_requires_institution() {
        let err = checked_education(NewEducation {
            institution: "   ".into(),
            degree: "BSc".into(),
            field_of_study: None,
            start_date: date!(2018 - 09 - 01),
            end_date: None,
        })
        .expect_err("blank institution");

        assert!(matches!(err, OnboardingError::InvalidArgument(message) if message.contains("institution")));
    }

    #[test]
    fn empty_personal_data_is_rejected() {
        let err = checked_overview(ProfessionalOverviewParams {
            city: Some(" ".into()),
            ..Default::default()
        })
        .expect_err("empty");
        assert!(matches!(err, OnboardingError::InvalidArgument(_)));
    }

    #[test]
    fn repo_not_found_is_named() {
        let err = OnboardingError::not_found_as("education")(RepoError::NotFound);
        assert!(matches!(err, OnboardingError::NotFound("education")));

        let err = OnboardingError::not_found_as("education")(RepoError::Timeout);
        assert!(matches!(err, OnboardingError::Repo(RepoError::Timeout)));
    }
}
