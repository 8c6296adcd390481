//! Domain entities mirrored from persistent storage.
//!
//! Joined representations (`StudentProfile`, `ServiceProviderProfile`,
//! `AdminProfile`) are what the cache stores, so every record here round-trips
//! through serde.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::types::{EmploymentType, IdentityDocumentKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub field: Option<String>,
    pub level: Option<String>,
    pub is_email_verified: bool,
    pub is_agreement_accepted: bool,
    pub need_email_notification: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecord {
    pub id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

/// A permission as linked to a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermission {
    #[serde(flatten)]
    pub permission: PermissionRecord,
    pub is_active: bool,
}

/// A role as attached to an admin, carrying its permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleGrant {
    #[serde(flatten)]
    pub role: RoleRecord,
    pub permissions: Vec<PermissionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationRecord {
    pub id: Uuid,
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperienceRecord {
    pub id: Uuid,
    pub company: String,
    pub title: String,
    pub employment_type: EmploymentType,
    pub location: Option<String>,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub working_here: bool,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalOverview {
    pub id: Uuid,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: Uuid,
    pub summary: String,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDocument {
    pub id: Uuid,
    pub kind: IdentityDocumentKind,
    pub public_id: String,
    pub url: String,
    pub format: Option<String>,
    pub original_filename: Option<String>,
    pub uploaded_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInformation {
    pub job_title: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub onboarding_step: i32,
    pub onboarding_complete: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub onboarding_step: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub deleted: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Student with every declared relation joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    #[serde(flatten)]
    pub student: StudentRecord,
    pub user: UserSummary,
    pub category: Option<CategoryRecord>,
    pub skills: Vec<SkillRecord>,
    pub education: Vec<EducationRecord>,
    pub work_experience: Vec<WorkExperienceRecord>,
    pub profile_summary: Option<ProfileSummary>,
    pub nysc_document: Option<IdentityDocument>,
    pub valid_id_document: Option<IdentityDocument>,
    pub professional_overview: Option<ProfessionalOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderProfile {
    #[serde(flatten)]
    pub service_provider: ServiceProviderRecord,
    pub user: UserSummary,
    pub professional_overview: Option<ProfessionalOverview>,
    pub skills: Vec<SkillRecord>,
    pub education: Vec<EducationRecord>,
    pub work_experience: Vec<WorkExperienceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    #[serde(flatten)]
    pub admin: AdminRecord,
    pub user: UserSummary,
    pub information: Option<AdminInformation>,
    pub roles: Vec<RoleGrant>,
}

/// Applicant row returned by the student listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListing {
    #[serde(flatten)]
    pub student: StudentRecord,
    pub user: UserSummary,
    pub professional_overview: Option<ProfessionalOverview>,
    pub category: Option<CategoryRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderListing {
    #[serde(flatten)]
    pub service_provider: ServiceProviderRecord,
    pub user: UserSummary,
    pub professional_overview: Option<ProfessionalOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListing {
    #[serde(flatten)]
    pub admin: AdminRecord,
    pub user: UserSummary,
    pub information: Option<AdminInformation>,
}
