use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    AccountsRepo, CatalogRepo, CompletionOutcome, NewEducation, NewWorkExperience,
    ProfessionalOverviewParams, ProfileOwner, ProfileWriteRepo, StoredDocument, StudentWriteRepo,
};
use crate::application::snapshots::{Committed, EntityRef};
use crate::application::uploads::{DocumentUpload, HostedFile, ImageHost, validate_document};
use crate::domain::entities::{
    EducationRecord, ProfessionalOverview, ProfileSummary, StudentRecord, WorkExperienceRecord,
};
use crate::domain::types::IdentityDocumentKind;

use super::{
    OnboardingError, checked_education, checked_overview, checked_skills,
    checked_work_experience,
};

const SOURCE: &str = "application::onboarding::student";

/// NYSC certificate and valid ID submitted together.
#[derive(Debug, Clone)]
pub struct IdentityDocumentsUpload {
    pub nysc: DocumentUpload,
    pub valid_id: DocumentUpload,
}

#[derive(Clone)]
pub struct StudentOnboardingService {
    accounts: Arc<dyn AccountsRepo>,
    catalog: Arc<dyn CatalogRepo>,
    profiles: Arc<dyn ProfileWriteRepo>,
    writer: Arc<dyn StudentWriteRepo>,
    image_host: Arc<dyn ImageHost>,
}

impl StudentOnboardingService {
    pub fn new(
        accounts: Arc<dyn AccountsRepo>,
        catalog: Arc<dyn CatalogRepo>,
        profiles: Arc<dyn ProfileWriteRepo>,
        writer: Arc<dyn StudentWriteRepo>,
        image_host: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            accounts,
            catalog,
            profiles,
            writer,
            image_host,
        }
    }

    /// Creates the student on first use, otherwise changes its category.
    pub async fn select_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<Committed<StudentRecord>, OnboardingError> {
        if !self.accounts.user_exists(user_id).await? {
            return Err(OnboardingError::NotFound("user"));
        }
        if self.catalog.find_category(category_id).await?.is_none() {
            return Err(OnboardingError::NotFound("category"));
        }

        let record = self.writer.select_category(user_id, category_id).await?;
        info!(
            target = SOURCE,
            %user_id,
            %category_id,
            "student category selected"
        );
        Ok(touched(user_id, record))
    }

    /// Links the given skills; returns how many were newly linked.
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

    /// Uploads both documents to the image host, then records them.
    ///
    /// Uploads happen before the transaction opens; a failed upload writes
    /// nothing.
    pub async fn upload_identity_documents(
        &self,
        user_id: Uuid,
        upload: IdentityDocumentsUpload,
    ) -> Result<Committed<()>, OnboardingError> {
        validate_document("nysc", &upload.nysc)?;
        validate_document("validId", &upload.valid_id)?;
        let student = self.student(user_id).await?;

        let (nysc, valid_id) = tokio::try_join!(
            self.image_host.upload(&upload.nysc),
            self.image_host.upload(&upload.valid_id),
        )?;
        let documents = [
            stored(IdentityDocumentKind::Nysc, nysc, &upload.nysc),
            stored(IdentityDocumentKind::ValidId, valid_id, &upload.valid_id),
        ];

        self.writer
            .upsert_identity_documents(student.id, &documents)
            .await?;
        info!(
            target = SOURCE,
            %user_id,
            "identity documents stored"
        );
        Ok(touched(user_id, ()))
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

    /// Upserts the student's professional overview (phone, address, location).
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
        info!(target = SOURCE, %user_id, "student personal data saved");
        Ok(touched(user_id, overview))
    }

    pub async fn save_profile_summary(
        &self,
        user_id: Uuid,
        summary: &str,
    ) -> Result<Committed<ProfileSummary>, OnboardingError> {
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(OnboardingError::invalid("summary is required"));
        }
        let student = self.student(user_id).await?;

        let saved = self.writer.save_profile_summary(student.id, summary).await?;
        Ok(touched(user_id, saved))
    }

    /// Marks onboarding complete once every required part is present.
    pub async fn complete_onboarding(
        &self,
        user_id: Uuid,
    ) -> Result<Committed<()>, OnboardingError> {
        let student = self.student(user_id).await?;

        match self.writer.complete_onboarding(student.id).await? {
            CompletionOutcome::Completed => {
                info!(target = SOURCE, %user_id, "student onboarding completed");
                Ok(touched(user_id, ()))
            }
            CompletionOutcome::Missing(parts) => {
                let names = parts
                    .iter()
                    .map(|part| part.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(OnboardingError::invalid(format!(
                    "onboarding cannot be completed; missing {names}"
                )))
            }
        }
    }

    async fn student(&self, user_id: Uuid) -> Result<StudentRecord, OnboardingError> {
        self.accounts
            .find_student(user_id)
            .await?
            .ok_or(OnboardingError::NotFound("student"))
    }

    async fn owner(&self, user_id: Uuid) -> Result<ProfileOwner, OnboardingError> {
        Ok(ProfileOwner::Student(self.student(user_id).await?.id))
    }
}

fn touched<T>(user_id: Uuid, value: T) -> Committed<T> {
    Committed::new(value, vec![EntityRef::student(user_id)])
}

fn stored(
    kind: IdentityDocumentKind,
    hosted: HostedFile,
    upload: &DocumentUpload,
) -> StoredDocument {
    StoredDocument {
        kind,
        public_id: hosted.public_id,
        url: hosted.url,
        format: hosted.format,
        original_filename: upload.filename.clone(),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use time::macros::date;

    use super::*;
    use crate::application::onboarding::testing::{FakeImageHost, FakeStore};
    use crate::application::uploads::UploadError;
    use crate::domain::types::{EmploymentType, OnboardingStep};

    fn service(store: &Arc<FakeStore>, host: Arc<FakeImageHost>) -> StudentOnboardingService {
        StudentOnboardingService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            host,
        )
    }

    fn pdf(name: &str) -> DocumentUpload {
        DocumentUpload {
            filename: Some(name.into()),
            content_type: "application/pdf".into(),
            bytes: Bytes::from_static(b"%PDF-1.7"),
        }
    }

    fn education() -> NewEducation {
        NewEducation {
            institution: "University of Lagos".into(),
            degree: "BSc".into(),
            field_of_study: Some("Computer Science".into()),
            start_date: date!(2016 - 09 - 01),
            end_date: Some(date!(2020 - 07 - 01)),
        }
    }

    fn work() -> NewWorkExperience {
        NewWorkExperience {
            company: "Acme".into(),
            title: "Intern".into(),
            employment_type: EmploymentType::Internship,
            location: None,
            start_date: date!(2021 - 01 - 01),
            end_date: None,
            working_here: true,
            description: None,
        }
    }

    #[tokio::test]
    async fn select_category_creates_student() {
        let store = Arc::new(FakeStore::default());
        let user_id = store.add_user();
        let category_id = store.add_category();

        let committed = service(&store, Arc::default())
            .select_category(user_id, category_id)
            .await
            .expect("category");

        assert_eq!(committed.touched(), &[EntityRef::student(user_id)]);
        let record = store.student(user_id).expect("student row");
        assert_eq!(record.category_id, Some(category_id));
        assert_eq!(record.onboarding_step, OnboardingStep::Category.ordinal());
    }

    #[tokio::test]
    async fn unknown_category_writes_nothing() {
        let store = Arc::new(FakeStore::default());
        let user_id = store.add_user();

        let err = service(&store, Arc::default())
            .select_category(user_id, Uuid::new_v4())
            .await
            .expect_err("unknown category");

        assert!(matches!(err, OnboardingError::NotFound("category")));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = Arc::new(FakeStore::default());
        let category_id = store.add_category();

        let err = service(&store, Arc::default())
            .select_category(Uuid::new_v4(), category_id)
            .await
            .expect_err("unknown user");
        assert!(matches!(err, OnboardingError::NotFound("user")));
    }

    #[tokio::test]
    async fn add_skills_links_each_skill_once() {
        let store = Arc::new(FakeStore::default());
        let (user_id, student_id) = store.add_student();
        let skill = store.add_skill();

        let added = service(&store, Arc::default())
            .add_skills(user_id, &[skill, skill])
            .await
            .expect("skills");

        assert_eq!(added.touched().len(), 1);
        assert_eq!(store.skill_links(ProfileOwner::Student(student_id)), 1);
    }

    #[tokio::test]
    async fn empty_skill_list_is_invalid() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_student();

        let err = service(&store, Arc::default())
            .add_skills(user_id, &[])
            .await
            .expect_err("empty");
        assert!(matches!(err, OnboardingError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_skill_is_not_found() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_student();
        let known = store.add_skill();

        let err = service(&store, Arc::default())
            .add_skills(user_id, &[known, Uuid::new_v4()])
            .await
            .expect_err("unknown skill");

        assert!(matches!(err, OnboardingError::NotFound("skill")));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn documents_are_uploaded_then_stored() {
        let store = Arc::new(FakeStore::default());
        let (user_id, student_id) = store.add_student();
        let host = Arc::new(FakeImageHost::default());

        let _ = service(&store, host.clone())
            .upload_identity_documents(
                user_id,
                IdentityDocumentsUpload {
                    nysc: pdf("nysc.pdf"),
                    valid_id: pdf("passport.pdf"),
                },
            )
            .await
            .expect("upload");

        assert_eq!(host.uploads.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(store.document_count(student_id), 2);
    }

    #[tokio::test]
    async fn failed_upload_writes_nothing() {
        let store = Arc::new(FakeStore::default());
        let (user_id, student_id) = store.add_student();
        let host = Arc::new(FakeImageHost {
            fail: true,
            ..Default::default()
        });

        let err = service(&store, host)
            .upload_identity_documents(
                user_id,
                IdentityDocumentsUpload {
                    nysc: pdf("nysc.pdf"),
                    valid_id: pdf("id.pdf"),
                },
            )
            .await
            .expect_err("host down");

        assert!(matches!(err, OnboardingError::Upload(UploadError::Unavailable(_))));
        assert_eq!(store.document_count(student_id), 0);
    }

    #[tokio::test]
    async fn unsupported_document_type_is_rejected_before_upload() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_student();
        let host = Arc::new(FakeImageHost::default());
        let mut valid_id = pdf("id.exe");
        valid_id.content_type = "application/x-msdownload".into();

        let err = service(&store, host.clone())
            .upload_identity_documents(
                user_id,
                IdentityDocumentsUpload {
                    nysc: pdf("nysc.pdf"),
                    valid_id,
                },
            )
            .await
            .expect_err("bad type");

        assert!(matches!(err, OnboardingError::Upload(UploadError::InvalidArgument(_))));
        assert_eq!(host.uploads.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delete_foreign_education_is_not_found() {
        let store = Arc::new(FakeStore::default());
        let (owner_user, _) = store.add_student();
        let (other_user, _) = store.add_student();
        let service = service(&store, Arc::default());

        let record = service
            .add_education(owner_user, education())
            .await
            .expect("education")
            .into_value();

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
    async fn work_experience_is_edited_and_removed_by_its_owner() {
        let store = Arc::new(FakeStore::default());
        let (owner_user, student_id) = store.add_student();
        let (other_user, _) = store.add_student();
        let service = service(&store, Arc::default());

        let record = service
            .add_work_experience(owner_user, work())
            .await
            .expect("work")
            .into_value();

        let mut promoted = work();
        promoted.title = " Engineer ".into();
        promoted.working_here = false;
        promoted.end_date = Some(date!(2023 - 06 - 30));
        let updated = service
            .update_work_experience(owner_user, record.id, promoted.clone())
            .await
            .expect("owner edits")
            .into_value();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.title, "Engineer");
        assert_eq!(updated.end_date, Some(date!(2023 - 06 - 30)));

        let err = service
            .update_work_experience(other_user, record.id, promoted)
            .await
            .expect_err("not owned");
        assert!(matches!(err, OnboardingError::NotFound("work experience")));

        let committed = service
            .delete_work_experience(owner_user, record.id)
            .await
            .expect("owner deletes");
        assert_eq!(committed.touched(), &[EntityRef::student(owner_user)]);
        assert_eq!(store.work_experience_count(ProfileOwner::Student(student_id)), 0);
    }

    #[tokio::test]
    async fn education_edit_rechecks_dates() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_student();
        let service = service(&store, Arc::default());
        let record = service
            .add_education(user_id, education())
            .await
            .expect("education")
            .into_value();
        let writes_before = store.write_count();

        let mut reversed = education();
        reversed.end_date = Some(date!(2015 - 01 - 01));
        let err = service
            .update_education(user_id, record.id, reversed)
            .await
            .expect_err("end before start");

        assert!(matches!(err, OnboardingError::InvalidArgument(_)));
        assert_eq!(store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn student_personal_data_is_stored_on_the_student() {
        let store = Arc::new(FakeStore::default());
        let (user_id, student_id) = store.add_student();

        let committed = service(&store, Arc::default())
            .save_personal_data(
                user_id,
                ProfessionalOverviewParams {
                    state: Some(" Lagos ".into()),
                    ..Default::default()
                },
            )
            .await
            .expect("personal data");

        assert_eq!(committed.touched(), &[EntityRef::student(user_id)]);
        assert_eq!(
            store
                .overview(ProfileOwner::Student(student_id))
                .and_then(|overview| overview.state),
            Some("Lagos".to_string())
        );
    }

    #[tokio::test]
    async fn complete_onboarding_names_missing_parts() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_student();
        let skill = store.add_skill();
        let service = service(&store, Arc::default());
        let _ = service.add_skills(user_id, &[skill]).await.expect("skills");
        let writes_before = store.write_count();

        let err = service
            .complete_onboarding(user_id)
            .await
            .expect_err("incomplete");

        let OnboardingError::InvalidArgument(message) = err else {
            panic!("expected invalid argument");
        };
        assert!(message.contains("education"));
        assert!(message.contains("work experience"));
        assert!(message.contains("valid ID"));
        assert!(!message.contains("skills"));
        assert_eq!(store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn complete_onboarding_after_every_step() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_student();
        let skill = store.add_skill();
        let service = service(&store, Arc::new(FakeImageHost::default()));

        let _ = service.add_skills(user_id, &[skill]).await.expect("skills");
        let _ = service
            .add_education(user_id, education())
            .await
            .expect("education");
        let _ = service
            .add_work_experience(user_id, work())
            .await
            .expect("work");
        let _ = service
            .upload_identity_documents(
                user_id,
                IdentityDocumentsUpload {
                    nysc: pdf("nysc.pdf"),
                    valid_id: pdf("id.pdf"),
                },
            )
            .await
            .expect("documents");

        let committed = service
            .complete_onboarding(user_id)
            .await
            .expect("complete");
        assert_eq!(committed.touched(), &[EntityRef::student(user_id)]);
        assert!(store.student(user_id).expect("student").onboarding_complete);
    }

    #[tokio::test]
    async fn blank_summary_is_invalid() {
        let store = Arc::new(FakeStore::default());
        let (user_id, _) = store.add_student();

        let err = service(&store, Arc::default())
            .save_profile_summary(user_id, "   ")
            .await
            .expect_err("blank");
        assert!(matches!(err, OnboardingError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn steps_require_existing_student() {
        let store = Arc::new(FakeStore::default());
        let user_id = store.add_user();

        let err = service(&store, Arc::default())
            .add_work_experience(user_id, work())
            .await
            .expect_err("no student");
        assert!(matches!(err, OnboardingError::NotFound("student")));
    }
}
