use std::sync::Arc;

use uuid::Uuid;

use crate::application::repos::{
    AccountsRepo, CatalogRepo, NewEducation, NewWorkExperience, ProfessionalOverviewParams,
    ProfileOwner, ProfileWriteRepo,
};
use crate::application::snapshots::{Committed, EntityRef};
use crate::domain::entities::{EducationRecord, ProfessionalOverview, WorkExperienceRecord};

use super::{
    OnboardingError, checked_education, checked_overview, checked_skills,
    checked_work_experience,
};

#[derive(Clone)]
pub struct ServiceProviderOnboardingService {
    accounts: Arc<dyn AccountsRepo>,
    catalog: Arc<dyn CatalogRepo>,
    profiles: Arc<dyn ProfileWriteRepo>,
}

impl ServiceProviderOnboardingService {
    pub fn new(
        accounts: Arc<dyn AccountsRepo>,
        catalog: Arc<dyn CatalogRepo>,
        profiles: Arc<dyn ProfileWriteRepo>,
    ) -> Self {
        Self {
            accounts,
            catalog,
            profiles,
        }
    }

    pub async fn add_skills(
        &self,
        user_id: Uuid,
        skill_ids: &[Uuid],
    ) -> Result<Committed<u64>, OnboardingError> {
        let skill_ids = checked_skills(&self.catalog, skill_ids).await?;
        let owner = self.owner(user_id).await?;

        let added = self.profiles.add_skills(owner, &skill_ids).await?;
        Ok(touched(user_id, added))
    }

    pub async fn add_education(
        &self,
        user_id: Uuid,
        params: NewEducation,
    ) -> Result<Committed<EducationRecord>, OnboardingError> {
        let params = checked_education(params)?;
        let owner = self.owner(user_id).await?;

        let record = self.profiles.add_education(owner, params).await?;
        Ok(touched(user_id, record))
    }

    pub async fn update_education(
        &self,
        user_id: Uuid,
        education_id: Uuid,
        params: NewEducation,
    ) -> Result<Committed<EducationRecord>, OnboardingError> {
        let params = checked_education(params)?;
        let owner = self.owner(user_id).await?;

        let record = self
            .profiles
            .update_education(owner, education_id, params)
            .await
            .map_err(OnboardingError::not_found_as("education"))?;
        Ok(touched(user_id, record))
    }

    pub async fn delete_education(
        &self,
        user_id: Uuid,
        education_id: Uuid,
    ) -> Result<Committed<()>, OnboardingError> {
        let owner = self.owner(user_id).await?;

        self.profiles
            .delete_education(owner, education_id)
            .await
            .map_err(OnboardingError::not_found_as("education"))?;
        Ok(touched(user_id, ()))
    }

    pub async fn add_work_experience(
        &self,
        user_id: Uuid,
        params: NewWorkExperience,
    ) -> Result<Committed<WorkExperienceRecord>, OnboardingError> {
        let params = checked_work_experience(params)?;
        let owner = self.owner(user_id).await?;

        let record = self.profiles.add_work_experience(owner, params).await?;
        Ok(touched(user_id, record))
    }

    pub async fn update_work_experience(
        &self,
        user_id: Uuid,
        work_experience_id: Uuid,
        params: NewWorkExperience,
    ) -> Result<Committed<WorkExperienceRecord>, OnboardingError> {
        let params = checked_work_experience(params)?;
        let owner = self.owner(user_id).await?;

        let record = self
            .profiles
            .update_work_experience(owner, work_experience_id, params)
            .await
            .map_err(OnboardingError::not_found_as("work experience"))?;
        Ok(touched(user_id, record))
    }

    pub async fn delete_work_experience(
        &self,
        user_id: Uuid,
        work_experience_id: Uuid,
    ) -> Result<Committed<()>, OnboardingError> {
        let owner = self.owner(user_id).await?;

        self.profiles
            .delete_work_experience(owner, work_experience_id)
            .await
            .map_err(OnboardingError::not_found_as("work experience"))?;
        Ok(touched(user_id, ()))
    }

    /// Upserts the professional overview (phone, address, location).
    pub async fn save_personal_data(
        &self,
        user_id: Uuid,
        params: ProfessionalOverviewParams,
    ) -> Result<Committed<ProfessionalOverview>, OnboardingError> {
        let params = checked_overview(params)?;
        let owner = self.owner(user_id).await?;

        let overview = self
            .profiles
            .upsert_professional_overview(owner, params)
            .await?;
        Ok(touched(user_id, overview))
    }

    async fn owner(&self, user_id: Uuid) -> Result<ProfileOwner, OnboardingError> {
        let record = self
            .accounts
            .find_service_provider(user_id)
            .await?
            .ok_or(OnboardingError::NotFound("service provider"))?;
        Ok(ProfileOwner::ServiceProvider(record.id))
    }
}

fn touched<T>(user_id: Uuid, value: T) -> Committed<T> {
    Committed::new(value, vec![EntityRef::service_provider(user_id)])
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::application::onboarding::testing::FakeStore;
    use crate::domain::types::EmploymentType;

    fn service(store: &Arc<FakeStore>) -> ServiceProviderOnboardingService {
        ServiceProviderOnboardingService::new(store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn skills_touch_service_provider_snapshot() {
        let store = Arc::new(FakeStore::default());
        let (user_id, provider_id) = store.add_service_provider();
        let skill = store.add_skill();

        let committed = service(&store)
            .add_skills(user_id, &[skill])
            .await
            .expect("skills");

        assert_eq!(committed.touched(), &[EntityRef::service_provider(user_id)]);
        assert_eq!(
            store.skill_links(ProfileOwner::ServiceProvider(provider_id)),
            1
        );
    }

    #[tokio::test]
    async fn students_are_not_service_providers() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_student();

        let err = service(&store)
            .save_personal_data(
                user_id,
                ProfessionalOverviewParams {
                    city: Some("Lagos".into()),
                    ..Default::default()
                },
            )
            .await
            .expect_err("not a service provider");

        assert!(matches!(err, OnboardingError::NotFound("service provider")));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn personal_data_is_trimmed() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_service_provider();

        let overview = service(&store)
            .save_personal_data(
                user_id,
                ProfessionalOverviewParams {
                    phone_number: Some(" +2348000000000 ".into()),
                    state: Some("Lagos".into()),
                    country: Some("".into()),
                    ..Default::default()
                },
            )
            .await
            .expect("personal data")
            .into_value();

        assert_eq!(overview.phone_number.as_deref(), Some("+2348000000000"));
        assert_eq!(overview.country, None);
    }

    #[tokio::test]
    async fn invalid_work_dates_write_nothing() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_service_provider();

        let err = service(&store)
            .add_work_experience(
                user_id,
                NewWorkExperience {
                    company: "Acme".into(),
                    title: "Plumber".into(),
                    employment_type: EmploymentType::Contract,
                    location: None,
                    start_date: date!(2023 - 05 - 01),
                    end_date: Some(date!(2023 - 04 - 01)),
                    working_here: false,
                    description: None,
                },
            )
            .await
            .expect_err("end before start");

        assert!(matches!(err, OnboardingError::InvalidArgument(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn education_edits_stay_with_their_owner() {
        let store = Arc::new(FakeStore::default());
        let (owner_user, _) = store.add_service_provider();
        let (other_user, _) = store.add_service_provider();
        let service = service(&store);
        let entry = NewEducation {
            institution: "Yaba College of Technology".into(),
            degree: "OND".into(),
            field_of_study: None,
            start_date: date!(2012 - 01 - 10),
            end_date: None,
        };

        let record = service
            .add_education(owner_user, entry.clone())
            .await
            .expect("education")
            .into_value();

        let upgraded = NewEducation {
            degree: "HND".into(),
            ..entry
        };
        let err = service
            .update_education(other_user, record.id, upgraded.clone())
            .await
            .expect_err("not owned");
        assert!(matches!(err, OnboardingError::NotFound("education")));

        let updated = service
            .update_education(owner_user, record.id, upgraded)
            .await
            .expect("owner edits");
        assert_eq!(updated.touched(), &[EntityRef::service_provider(owner_user)]);
        assert_eq!(updated.into_value().degree, "HND");

        let err = service
            .delete_education(other_user, record.id)
            .await
            .expect_err("not owned");
        assert!(matches!(err, OnboardingError::NotFound("education")));
        let _ = service
            .delete_education(owner_user, record.id)
            .await
            .expect("owner deletes");
    }

    #[tokio::test]
    async fn unknown_work_experience_cannot_be_deleted() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_service_provider();

        let err = service(&store)
            .delete_work_experience(user_id, Uuid::new_v4())
            .await
            .expect_err("unknown entry");
        assert!(matches!(err, OnboardingError::NotFound("work experience")));
    }

    #[tokio::test]
    async fn education_is_recorded() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_service_provider();

        let record = service(&store)
            .add_education(
                user_id,
                NewEducation {
                    institution: "Yaba College of Technology".into(),
                    degree: "HND".into(),
                    field_of_study: None,
                    start_date: date!(2015 - 01 - 10),
                    end_date: None,
                },
            )
            .await
            .expect("education")
            .into_value();

        assert_eq!(record.degree, "HND");
    }
}
