//! Row types and column lists shared by the Postgres adapters.
//!
//! Joined relations are selected with a table prefix (`u_`, `po_`, `c_`,
//! `ai_`) so several of them can be flattened into one row.

use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::domain::entities::{
    AdminInformation, AdminRecord, CategoryRecord, EducationRecord, IdentityDocument,
    PermissionRecord, ProfessionalOverview, ProfileSummary, RolePermission, RoleRecord,
    ServiceProviderRecord, SkillRecord, StudentRecord, UserSummary, WorkExperienceRecord,
};

pub(super) const USER_COLUMNS: &str = "u.id AS u_id, u.first_name AS u_first_name, \
    u.last_name AS u_last_name, u.email AS u_email, u.field AS u_field, u.level AS u_level, \
    u.is_email_verified AS u_is_email_verified, \
    u.is_agreement_accepted AS u_is_agreement_accepted, \
    u.need_email_notification AS u_need_email_notification, \
    u.created_at AS u_created_at, u.updated_at AS u_updated_at";

pub(super) const OVERVIEW_COLUMNS: &str = "po.id AS po_id, po.phone_number AS po_phone_number, \
    po.address AS po_address, po.city AS po_city, po.state AS po_state, \
    po.country AS po_country, po.updated_at AS po_updated_at";

pub(super) const CATEGORY_COLUMNS: &str = "c.id AS c_id, c.name AS c_name, \
    c.description AS c_description, c.created_at AS c_created_at";

pub(super) const ADMIN_INFO_COLUMNS: &str = "ai.admin_id AS ai_admin_id, \
    ai.job_title AS ai_job_title, ai.phone_number AS ai_phone_number";

pub(super) const STUDENT_COLUMNS: &str = "s.id, s.user_id, s.category_id, s.onboarding_step, \
    s.onboarding_complete, s.created_at, s.updated_at";

pub(super) const SERVICE_PROVIDER_COLUMNS: &str =
    "sp.id, sp.user_id, sp.onboarding_step, sp.created_at, sp.updated_at";

pub(super) const ADMIN_COLUMNS: &str = "a.id, a.user_id, a.deleted, a.created_at, a.updated_at";

#[derive(sqlx::FromRow)]
pub(super) struct UserColumns {
    u_id: Uuid,
    u_first_name: String,
    u_last_name: String,
    u_email: String,
    u_field: Option<String>,
    u_level: Option<String>,
    u_is_email_verified: bool,
    u_is_agreement_accepted: bool,
    u_need_email_notification: bool,
    u_created_at: OffsetDateTime,
    u_updated_at: OffsetDateTime,
}

impl From<UserColumns> for UserSummary {
    fn from(row: UserColumns) -> Self {
        Self {
            id: row.u_id,
            first_name: row.u_first_name,
            last_name: row.u_last_name,
            email: row.u_email,
            field: row.u_field,
            level: row.u_level,
            is_email_verified: row.u_is_email_verified,
            is_agreement_accepted: row.u_is_agreement_accepted,
            need_email_notification: row.u_need_email_notification,
            created_at: row.u_created_at,
            updated_at: row.u_updated_at,
        }
    }
}

/// Professional overview columns from a `LEFT JOIN`; all null when absent.
#[derive(sqlx::FromRow)]
pub(super) struct OverviewColumns {
    po_id: Option<Uuid>,
    po_phone_number: Option<String>,
    po_address: Option<String>,
    po_city: Option<String>,
    po_state: Option<String>,
    po_country: Option<String>,
    po_updated_at: Option<OffsetDateTime>,
}

impl OverviewColumns {
    pub(super) fn into_overview(self) -> Option<ProfessionalOverview> {
        Some(ProfessionalOverview {
            id: self.po_id?,
            phone_number: self.po_phone_number,
            address: self.po_address,
            city: self.po_city,
            state: self.po_state,
            country: self.po_country,
            updated_at: self.po_updated_at?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CategoryColumns {
    c_id: Option<Uuid>,
    c_name: Option<String>,
    c_description: Option<String>,
    c_created_at: Option<OffsetDateTime>,
}

impl CategoryColumns {
    pub(super) fn into_category(self) -> Option<CategoryRecord> {
        Some(CategoryRecord {
            id: self.c_id?,
            name: self.c_name?,
            description: self.c_description,
            created_at: self.c_created_at?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct AdminInfoColumns {
    ai_admin_id: Option<Uuid>,
    ai_job_title: Option<String>,
    ai_phone_number: Option<String>,
}

impl AdminInfoColumns {
    pub(super) fn into_information(self) -> Option<AdminInformation> {
        self.ai_admin_id.map(|_| AdminInformation {
            job_title: self.ai_job_title,
            phone_number: self.ai_phone_number,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct StudentRow {
    id: Uuid,
    user_id: Uuid,
    category_id: Option<Uuid>,
    onboarding_step: i32,
    onboarding_complete: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl StudentRow {
    pub(super) fn id(&self) -> Uuid {
        self.id
    }
}

impl From<StudentRow> for StudentRecord {
    fn from(row: StudentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            category_id: row.category_id,
            onboarding_step: row.onboarding_step,
            onboarding_complete: row.onboarding_complete,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ServiceProviderRow {
    id: Uuid,
    user_id: Uuid,
    onboarding_step: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl ServiceProviderRow {
    pub(super) fn id(&self) -> Uuid {
        self.id
    }
}

impl From<ServiceProviderRow> for ServiceProviderRecord {
    fn from(row: ServiceProviderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            onboarding_step: row.onboarding_step,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct AdminRow {
    id: Uuid,
    user_id: Uuid,
    deleted: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl AdminRow {
    pub(super) fn id(&self) -> Uuid {
        self.id
    }
}

impl From<AdminRow> for AdminRecord {
    fn from(row: AdminRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// One account with its user and one-to-one relations, as selected by
/// listings and snapshot loads.
#[derive(sqlx::FromRow)]
pub(super) struct StudentListingRow {
    #[sqlx(flatten)]
    pub(super) student: StudentRow,
    #[sqlx(flatten)]
    pub(super) user: UserColumns,
    #[sqlx(flatten)]
    pub(super) overview: OverviewColumns,
    #[sqlx(flatten)]
    pub(super) category: CategoryColumns,
}

#[derive(sqlx::FromRow)]
pub(super) struct ServiceProviderListingRow {
    #[sqlx(flatten)]
    pub(super) service_provider: ServiceProviderRow,
    #[sqlx(flatten)]
    pub(super) user: UserColumns,
    #[sqlx(flatten)]
    pub(super) overview: OverviewColumns,
}

#[derive(sqlx::FromRow)]
pub(super) struct AdminListingRow {
    #[sqlx(flatten)]
    pub(super) admin: AdminRow,
    #[sqlx(flatten)]
    pub(super) user: UserColumns,
    #[sqlx(flatten)]
    pub(super) information: AdminInfoColumns,
}

#[derive(sqlx::FromRow)]
pub(super) struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: OffsetDateTime,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct SkillRow {
    id: Uuid,
    name: String,
    created_at: OffsetDateTime,
}

impl From<SkillRow> for SkillRecord {
    fn from(row: SkillRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct RoleRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: OffsetDateTime,
}

impl From<RoleRow> for RoleRecord {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct PermissionRow {
    pub(super) role_id: Uuid,
    id: Uuid,
    name: String,
    description: Option<String>,
}

impl From<PermissionRow> for PermissionRecord {
    fn from(row: PermissionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct RolePermissionRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    is_active: bool,
}

impl From<RolePermissionRow> for RolePermission {
    fn from(row: RolePermissionRow) -> Self {
        Self {
            permission: PermissionRecord {
                id: row.id,
                name: row.name,
                description: row.description,
            },
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct EducationRow {
    id: Uuid,
    institution: String,
    degree: String,
    field_of_study: Option<String>,
    start_date: Date,
    end_date: Option<Date>,
    created_at: OffsetDateTime,
}

impl From<EducationRow> for EducationRecord {
    fn from(row: EducationRow) -> Self {
        Self {
            id: row.id,
            institution: row.institution,
            degree: row.degree,
            field_of_study: row.field_of_study,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct WorkExperienceRow {
    id: Uuid,
    company: String,
    title: String,
    employment_type: String,
    location: Option<String>,
    start_date: Date,
    end_date: Option<Date>,
    working_here: bool,
    description: Option<String>,
    created_at: OffsetDateTime,
}

impl TryFrom<WorkExperienceRow> for WorkExperienceRecord {
    type Error = RepoError;

    fn try_from(row: WorkExperienceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            company: row.company,
            title: row.title,
            employment_type: row
                .employment_type
                .parse()
                .map_err(RepoError::from_persistence)?,
            location: row.location,
            start_date: row.start_date,
            end_date: row.end_date,
            working_here: row.working_here,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct OverviewRow {
    id: Uuid,
    phone_number: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    updated_at: OffsetDateTime,
}

impl From<OverviewRow> for ProfessionalOverview {
    fn from(row: OverviewRow) -> Self {
        Self {
            id: row.id,
            phone_number: row.phone_number,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ProfileSummaryRow {
    id: Uuid,
    summary: String,
    updated_at: OffsetDateTime,
}

impl From<ProfileSummaryRow> for ProfileSummary {
    fn from(row: ProfileSummaryRow) -> Self {
        Self {
            id: row.id,
            summary: row.summary,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct IdentityDocumentRow {
    id: Uuid,
    kind: String,
    public_id: String,
    url: String,
    format: Option<String>,
    original_filename: Option<String>,
    uploaded_at: OffsetDateTime,
}

impl TryFrom<IdentityDocumentRow> for IdentityDocument {
    type Error = RepoError;

    fn try_from(row: IdentityDocumentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            kind: row.kind.parse().map_err(RepoError::from_persistence)?,
            public_id: row.public_id,
            url: row.url,
            format: row.format,
            original_filename: row.original_filename,
            uploaded_at: row.uploaded_at,
        })
    }
}
