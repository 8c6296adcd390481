//! In-memory collaborators shared by the onboarding service tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    AccountsRepo, CatalogRepo, CompletionOutcome, MissingPart, NewEducation, NewWorkExperience,
    ProfessionalOverviewParams, ProfileOwner, ProfileWriteRepo, RepoError, StoredDocument,
    StudentWriteRepo,
};
use crate::application::uploads::{DocumentUpload, HostedFile, ImageHost, UploadError};
use crate::domain::entities::{
    AdminRecord, CategoryRecord, EducationRecord, ProfessionalOverview, ProfileSummary,
    RoleRecord, ServiceProviderRecord, SkillRecord, StudentRecord, WorkExperienceRecord,
};
use crate::domain::types::IdentityDocumentKind;

#[derive(Default)]
struct State {
    users: HashSet<Uuid>,
    categories: HashSet<Uuid>,
    skills: HashSet<Uuid>,
    students: HashMap<Uuid, StudentRecord>,
    service_providers: HashMap<Uuid, ServiceProviderRecord>,
    skill_links: HashSet<(ProfileOwner, Uuid)>,
    education: HashMap<Uuid, ProfileOwner>,
    work_experience: HashMap<Uuid, ProfileOwner>,
    documents: HashMap<(Uuid, IdentityDocumentKind), StoredDocument>,
    summaries: HashMap<Uuid, String>,
    overviews: HashMap<ProfileOwner, ProfessionalOverviewParams>,
}

/// Canonical storage stub implementing every repository onboarding needs.
#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<State>,
    pub(crate) writes: AtomicUsize,
}

impl FakeStore {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("state lock")
    }

    pub(crate) fn add_user(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.state().users.insert(id);
        id
    }

    pub(crate) fn add_category(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.state().categories.insert(id);
        id
    }

    pub(crate) fn add_skill(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.state().skills.insert(id);
        id
    }

    pub(crate) fn add_student(&self) -> (Uuid, Uuid) {
        let user_id = self.add_user();
        let record = student_record(user_id, None, 0);
        let student_id = record.id;
        self.state().students.insert(user_id, record);
        (user_id, student_id)
    }

    pub(crate) fn add_service_provider(&self) -> (Uuid, Uuid) {
        let user_id = self.add_user();
        let now = OffsetDateTime::now_utc();
        let record = ServiceProviderRecord {
            id: Uuid::new_v4(),
            user_id,
            onboarding_step: 0,
            created_at: now,
            updated_at: now,
        };
        let id = record.id;
        self.state().service_providers.insert(user_id, record);
        (user_id, id)
    }

    pub(crate) fn student(&self, user_id: Uuid) -> Option<StudentRecord> {
        self.state().students.get(&user_id).cloned()
    }

    pub(crate) fn skill_links(&self, owner: ProfileOwner) -> usize {
        self.state()
            .skill_links
            .iter()
            .filter(|(linked, _)| *linked == owner)
            .count()
    }

    pub(crate) fn work_experience_count(&self, owner: ProfileOwner) -> usize {
        self.state()
            .work_experience
            .values()
            .filter(|linked| **linked == owner)
            .count()
    }

    pub(crate) fn overview(&self, owner: ProfileOwner) -> Option<ProfessionalOverviewParams> {
        self.state().overviews.get(&owner).cloned()
    }

    pub(crate) fn document_count(&self, student_id: Uuid) -> usize {
        self.state()
            .documents
            .keys()
            .filter(|(owner, _)| *owner == student_id)
            .count()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn student_record(user_id: Uuid, category_id: Option<Uuid>, step: i32) -> StudentRecord {
    let now = OffsetDateTime::now_utc();
    StudentRecord {
        id: Uuid::new_v4(),
        user_id,
        category_id,
        onboarding_step: step,
        onboarding_complete: false,
        created_at: now,
        updated_at: now,
    }
}

fn education_record(id: Uuid, params: NewEducation) -> EducationRecord {
    EducationRecord {
        id,
        institution: params.institution,
        degree: params.degree,
        field_of_study: params.field_of_study,
        start_date: params.start_date,
        end_date: params.end_date,
        created_at: OffsetDateTime::now_utc(),
    }
}

fn work_experience_record(id: Uuid, params: NewWorkExperience) -> WorkExperienceRecord {
    WorkExperienceRecord {
        id,
        company: params.company,
        title: params.title,
        employment_type: params.employment_type,
        location: params.location,
        start_date: params.start_date,
        end_date: params.end_date,
        working_here: params.working_here,
        description: params.description,
        created_at: OffsetDateTime::now_utc(),
    }
}

#[async_trait]
impl AccountsRepo for FakeStore {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, RepoError> {
        Ok(self.state().users.contains(&user_id))
    }

    async fn find_student(&self, user_id: Uuid) -> Result<Option<StudentRecord>, RepoError> {
        Ok(self.state().students.get(&user_id).cloned())
    }

    async fn find_service_provider(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ServiceProviderRecord>, RepoError> {
        Ok(self.state().service_providers.get(&user_id).cloned())
    }

    async fn find_admin(&self, _user_id: Uuid) -> Result<Option<AdminRecord>, RepoError> {
        Ok(None)
    }

    async fn find_admins(&self, _user_ids: &[Uuid]) -> Result<Vec<AdminRecord>, RepoError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl CatalogRepo for FakeStore {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn list_skills(&self) -> Result<Vec<SkillRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self.state().categories.contains(&id).then(|| CategoryRecord {
            id,
            name: "Engineering".into(),
            description: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }))
    }

    async fn missing_skills(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError> {
        let state = self.state();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !state.skills.contains(id))
            .collect())
    }

    async fn missing_roles(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError> {
        Ok(ids.to_vec())
    }
}

#[async_trait]
impl ProfileWriteRepo for FakeStore {
    async fn add_skills(&self, owner: ProfileOwner, skill_ids: &[Uuid]) -> Result<u64, RepoError> {
        self.record_write();
        let mut state = self.state();
        let added = skill_ids
            .iter()
            .filter(|id| state.skill_links.insert((owner, **id)))
            .count();
        Ok(added as u64)
    }

    async fn add_education(
        &self,
        owner: ProfileOwner,
        params: NewEducation,
    ) -> Result<EducationRecord, RepoError> {
        self.record_write();
        let id = Uuid::new_v4();
        self.state().education.insert(id, owner);
        Ok(education_record(id, params))
    }

    async fn update_education(
        &self,
        owner: ProfileOwner,
        education_id: Uuid,
        params: NewEducation,
    ) -> Result<EducationRecord, RepoError> {
        self.record_write();
        if self.state().education.get(&education_id) != Some(&owner) {
            return Err(RepoError::NotFound);
        }
        Ok(education_record(education_id, params))
    }

    async fn delete_education(
        &self,
        owner: ProfileOwner,
        education_id: Uuid,
    ) -> Result<(), RepoError> {
        self.record_write();
        let mut state = self.state();
        match state.education.get(&education_id) {
            Some(existing) if *existing == owner => {
                state.education.remove(&education_id);
                Ok(())
            }
            _ => Err(RepoError::NotFound),
        }
    }

    async fn add_work_experience(
        &self,
        owner: ProfileOwner,
        params: NewWorkExperience,
    ) -> Result<WorkExperienceRecord, RepoError> {
        self.record_write();
        let id = Uuid::new_v4();
        self.state().work_experience.insert(id, owner);
        Ok(work_experience_record(id, params))
    }

    async fn update_work_experience(
        &self,
        owner: ProfileOwner,
        work_experience_id: Uuid,
        params: NewWorkExperience,
    ) -> Result<WorkExperienceRecord, RepoError> {
        self.record_write();
        if self.state().work_experience.get(&work_experience_id) != Some(&owner) {
            return Err(RepoError::NotFound);
        }
        Ok(work_experience_record(work_experience_id, params))
    }

    async fn delete_work_experience(
        &self,
        owner: ProfileOwner,
        work_experience_id: Uuid,
    ) -> Result<(), RepoError> {
        self.record_write();
        let mut state = self.state();
        match state.work_experience.get(&work_experience_id) {
            Some(existing) if *existing == owner => {
                state.work_experience.remove(&work_experience_id);
                Ok(())
            }
            _ => Err(RepoError::NotFound),
        }
    }

    async fn upsert_professional_overview(
        &self,
        owner: ProfileOwner,
        params: ProfessionalOverviewParams,
    ) -> Result<ProfessionalOverview, RepoError> {
        self.record_write();
        self.state().overviews.insert(owner, params.clone());
        Ok(ProfessionalOverview {
            id: Uuid::new_v4(),
            phone_number: params.phone_number,
            address: params.address,
            city: params.city,
            state: params.state,
            country: params.country,
            updated_at: OffsetDateTime::now_utc(),
        })
    }
}

#[async_trait]
impl StudentWriteRepo for FakeStore {
    async fn select_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<StudentRecord, RepoError> {
        self.record_write();
        let mut state = self.state();
        let record = state
            .students
            .entry(user_id)
            .or_insert_with(|| student_record(user_id, None, 0));
        record.category_id = Some(category_id);
        record.onboarding_step = 1;
        Ok(record.clone())
    }

    async fn upsert_identity_documents(
        &self,
        student_id: Uuid,
        documents: &[StoredDocument],
    ) -> Result<(), RepoError> {
        self.record_write();
        let mut state = self.state();
        for document in documents {
            state
                .documents
                .insert((student_id, document.kind), document.clone());
        }
        Ok(())
    }

    async fn save_profile_summary(
        &self,
        student_id: Uuid,
        summary: &str,
    ) -> Result<ProfileSummary, RepoError> {
        self.record_write();
        self.state()
            .summaries
            .insert(student_id, summary.to_string());
        Ok(ProfileSummary {
            id: Uuid::new_v4(),
            summary: summary.to_string(),
            updated_at: OffsetDateTime::now_utc(),
        })
    }

    async fn complete_onboarding(&self, student_id: Uuid) -> Result<CompletionOutcome, RepoError> {
        let mut state = self.state();
        let owner = ProfileOwner::Student(student_id);
        let mut missing = Vec::new();
        if !state.skill_links.iter().any(|(linked, _)| *linked == owner) {
            missing.push(MissingPart::Skills);
        }
        if !state.education.values().any(|linked| *linked == owner) {
            missing.push(MissingPart::Education);
        }
        if !state.work_experience.values().any(|linked| *linked == owner) {
            missing.push(MissingPart::WorkExperience);
        }
        if !state
            .documents
            .contains_key(&(student_id, IdentityDocumentKind::ValidId))
        {
            missing.push(MissingPart::ValidId);
        }
        if !missing.is_empty() {
            return Ok(CompletionOutcome::Missing(missing));
        }

        if let Some(record) = state.students.values_mut().find(|s| s.id == student_id) {
            record.onboarding_complete = true;
        }
        drop(state);
        self.record_write();
        Ok(CompletionOutcome::Completed)
    }
}

/// Image host stub that records uploads and can be told to fail.
#[derive(Default)]
pub(crate) struct FakeImageHost {
    pub(crate) uploads: AtomicUsize,
    pub(crate) fail: bool,
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(&self, document: &DocumentUpload) -> Result<HostedFile, UploadError> {
        if self.fail {
            return Err(UploadError::Unavailable("image host offline".into()));
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(HostedFile {
            public_id: format!("doc-{n}"),
            url: format!("https://images.example.com/doc-{n}"),
            format: document.filename.as_deref().and_then(|name| {
                name.rsplit_once('.').map(|(_, ext)| ext.to_string())
            }),
        })
    }
}
