//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::Date;
use uuid::Uuid;

use crate::application::listing::{CollectionQuery, ListedRecord, OrderSpec};
use crate::domain::entities::{
    AdminRecord, CategoryRecord, EducationRecord, PermissionRecord, ProfessionalOverview,
    ProfileSummary, RolePermission, RoleRecord, ServiceProviderRecord, SkillRecord, StudentRecord,
    WorkExperienceRecord,
};
use crate::domain::types::{EmploymentType, IdentityDocumentKind};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Canonical reads backing the listing engine.
#[async_trait]
pub trait ListingRepo: Send + Sync {
    async fn find_many(
        &self,
        query: &CollectionQuery,
        order: OrderSpec,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<ListedRecord>, RepoError>;

    async fn count(&self, query: &CollectionQuery) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn list_skills(&self) -> Result<Vec<SkillRecord>, RepoError>;

    async fn list_roles(&self) -> Result<Vec<RoleRecord>, RepoError>;

    async fn find_category(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError>;

    /// Returns the subset of `ids` with no matching skill.
    async fn missing_skills(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError>;

    /// Returns the subset of `ids` with no matching role.
    async fn missing_roles(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError>;
}

/// Existence lookups used before a mutation. Always canonical, never cached.
#[async_trait]
pub trait AccountsRepo: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, RepoError>;

    async fn find_student(&self, user_id: Uuid) -> Result<Option<StudentRecord>, RepoError>;

    async fn find_service_provider(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ServiceProviderRecord>, RepoError>;

    async fn find_admin(&self, user_id: Uuid) -> Result<Option<AdminRecord>, RepoError>;

    async fn find_admins(&self, user_ids: &[Uuid]) -> Result<Vec<AdminRecord>, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}

/// Row that owns skills, education, work experience and a professional overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileOwner {
    Student(Uuid),
    ServiceProvider(Uuid),
}

#[derive(Debug, Clone)]
pub struct NewEducation {
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: Date,
    pub end_date: Option<Date>,
}

#[derive(Debug, Clone)]
pub struct NewWorkExperience {
    pub company: String,
    pub title: String,
    pub employment_type: EmploymentType,
    pub location: Option<String>,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub working_here: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfessionalOverviewParams {
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// A document already stored on the image host, ready to be linked.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub kind: IdentityDocumentKind,
    pub public_id: String,
    pub url: String,
    pub format: Option<String>,
    pub original_filename: Option<String>,
}

/// Part of a student profile required before onboarding can complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPart {
    Skills,
    Education,
    WorkExperience,
    ValidId,
}

impl MissingPart {
    pub fn as_str(self) -> &'static str {
        match self {
            MissingPart::Skills => "skills",
            MissingPart::Education => "education",
            MissingPart::WorkExperience => "work experience",
            MissingPart::ValidId => "valid ID document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    /// Nothing was written; the transaction was rolled back.
    Missing(Vec<MissingPart>),
}

/// Writes shared by students and service providers. Each call runs in its
/// own serializable transaction. Adds and updates record the owner's
/// onboarding step; deletes leave it alone.
#[async_trait]
pub trait ProfileWriteRepo: Send + Sync {
    /// Links skills not yet linked; returns how many links were added.
    async fn add_skills(&self, owner: ProfileOwner, skill_ids: &[Uuid]) -> Result<u64, RepoError>;

    async fn add_education(
        &self,
        owner: ProfileOwner,
        params: NewEducation,
    ) -> Result<EducationRecord, RepoError>;

    /// Replaces an entry owned by `owner`; `NotFound` otherwise.
    async fn update_education(
        &self,
        owner: ProfileOwner,
        education_id: Uuid,
        params: NewEducation,
    ) -> Result<EducationRecord, RepoError>;

    /// Fails with `NotFound` when the entry does not belong to `owner`.
    async fn delete_education(&self, owner: ProfileOwner, education_id: Uuid)
    -> Result<(), RepoError>;

    async fn add_work_experience(
        &self,
        owner: ProfileOwner,
        params: NewWorkExperience,
    ) -> Result<WorkExperienceRecord, RepoError>;

    /// Replaces an entry owned by `owner`; `NotFound` otherwise.
    async fn update_work_experience(
        &self,
        owner: ProfileOwner,
        work_experience_id: Uuid,
        params: NewWorkExperience,
    ) -> Result<WorkExperienceRecord, RepoError>;

    async fn delete_work_experience(
        &self,
        owner: ProfileOwner,
        work_experience_id: Uuid,
    ) -> Result<(), RepoError>;

    async fn upsert_professional_overview(
        &self,
        owner: ProfileOwner,
        params: ProfessionalOverviewParams,
    ) -> Result<ProfessionalOverview, RepoError>;
}

#[async_trait]
pub trait StudentWriteRepo: Send + Sync {
    /// Creates the student row when absent, otherwise updates its category.
    async fn select_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<StudentRecord, RepoError>;

    async fn upsert_identity_documents(
        &self,
        student_id: Uuid,
        documents: &[StoredDocument],
    ) -> Result<(), RepoError>;

    async fn save_profile_summary(
        &self,
        student_id: Uuid,
        summary: &str,
    ) -> Result<ProfileSummary, RepoError>;

    async fn complete_onboarding(&self, student_id: Uuid) -> Result<CompletionOutcome, RepoError>;
}

#[async_trait]
pub trait AdminWriteRepo: Send + Sync {
    /// Grants roles not yet granted; returns how many grants were added.
    async fn assign_roles(&self, admin_id: Uuid, role_ids: &[Uuid]) -> Result<u64, RepoError>;

    async fn remove_roles(&self, admin_id: Uuid, role_ids: &[Uuid]) -> Result<u64, RepoError>;

    /// Flags every admin in `admin_ids`. Fails with `NotFound`, writing
    /// nothing, unless all of them were updated.
    async fn set_deleted(&self, admin_ids: &[Uuid], deleted: bool) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone)]
pub struct RoleParams {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PermissionParams {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGrant {
    pub permission_id: Uuid,
    pub is_active: bool,
}

/// Result of a role write plus the user ids of admins holding the role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleChange<T> {
    pub value: T,
    pub holders: Vec<Uuid>,
}

/// Role and permission administration. Writes that target an existing role
/// fail with `NotFound` when it is absent.
#[async_trait]
pub trait RoleAdminRepo: Send + Sync {
    async fn create_role(&self, params: RoleParams) -> Result<RoleRecord, RepoError>;

    async fn update_role(
        &self,
        role_id: Uuid,
        params: RoleParams,
    ) -> Result<RoleChange<RoleRecord>, RepoError>;

    /// Holders are collected before the role and its grants are removed.
    async fn delete_role(&self, role_id: Uuid) -> Result<RoleChange<()>, RepoError>;

    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, RepoError>;

    async fn create_permission(
        &self,
        params: PermissionParams,
    ) -> Result<PermissionRecord, RepoError>;

    /// Returns the subset of `ids` with no matching permission.
    async fn missing_permissions(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError>;

    /// Links permissions not yet linked; existing links keep their state.
    async fn attach_permissions(
        &self,
        role_id: Uuid,
        grants: &[PermissionGrant],
    ) -> Result<RoleChange<u64>, RepoError>;

    async fn detach_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<RoleChange<u64>, RepoError>;

    async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<RolePermission>, RepoError>;
}
