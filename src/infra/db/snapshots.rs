//! Canonical profile reads backing the snapshot cache.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::try_join;
use sqlx::{PgPool, query_as};
use uuid::Uuid;

use crate::{
    application::repos::{ProfileOwner, RepoError},
    application::snapshots::SnapshotSource,
    domain::entities::{
        AdminProfile, EducationRecord, IdentityDocument, PermissionRecord, ProfileSummary,
        RoleGrant, RoleRecord, ServiceProviderProfile, SkillRecord, StudentProfile,
        WorkExperienceRecord,
    },
    domain::types::{EntityKind, IdentityDocumentKind},
};

use super::{
    PostgresRepositories,
    listing::head_query,
    map_sqlx_error,
    profiles::OwnerTables,
    rows::{
        AdminListingRow, EducationRow, IdentityDocumentRow, PermissionRow, ProfileSummaryRow,
        RoleRow, ServiceProviderListingRow, SkillRow, StudentListingRow, WorkExperienceRow,
    },
};

async fn load_skills(pool: &PgPool, owner: OwnerTables) -> Result<Vec<SkillRecord>, RepoError> {
    let sql = format!(
        "SELECT sk.id, sk.name, sk.created_at FROM {} link \
         INNER JOIN skills sk ON sk.id = link.skill_id \
         WHERE link.{} = $1 ORDER BY LOWER(sk.name), sk.id",
        owner.skills_table, owner.column
    );
    let rows = query_as::<_, SkillRow>(&sql)
        .bind(owner.id)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(SkillRecord::from).collect())
}

async fn load_education(
    pool: &PgPool,
    owner: OwnerTables,
) -> Result<Vec<EducationRecord>, RepoError> {
    let sql = format!(
        "SELECT id, institution, degree, field_of_study, start_date, end_date, created_at \
         FROM education WHERE {} = $1 ORDER BY start_date DESC, id",
        owner.column
    );
    let rows = query_as::<_, EducationRow>(&sql)
        .bind(owner.id)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(EducationRecord::from).collect())
}

async fn load_work_experience(
    pool: &PgPool,
    owner: OwnerTables,
) -> Result<Vec<WorkExperienceRecord>, RepoError> {
    let sql = format!(
        "SELECT id, company, title, employment_type, location, start_date, end_date, \
         working_here, description, created_at \
         FROM work_experience WHERE {} = $1 ORDER BY start_date DESC, id",
        owner.column
    );
    let rows = query_as::<_, WorkExperienceRow>(&sql)
        .bind(owner.id)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;
    rows.into_iter().map(WorkExperienceRecord::try_from).collect()
}

async fn load_summary(
    pool: &PgPool,
    student_id: Uuid,
) -> Result<Option<ProfileSummary>, RepoError> {
    let row = query_as::<_, ProfileSummaryRow>(
        "SELECT id, summary, updated_at FROM profile_summaries WHERE student_id = $1",
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(row.map(ProfileSummary::from))
}

async fn load_documents(
    pool: &PgPool,
    student_id: Uuid,
) -> Result<Vec<IdentityDocument>, RepoError> {
    let rows = query_as::<_, IdentityDocumentRow>(
        r#"
        SELECT id, kind, public_id, url, format, original_filename, uploaded_at
        FROM identity_documents
        WHERE student_id = $1
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;
    rows.into_iter().map(IdentityDocument::try_from).collect()
}

async fn load_role_grants(pool: &PgPool, admin_id: Uuid) -> Result<Vec<RoleGrant>, RepoError> {
    let roles = query_as::<_, RoleRow>(
        r#"
        SELECT r.id, r.name, r.description, r.created_at
        FROM admin_roles ar
        INNER JOIN roles r ON r.id = ar.role_id
        WHERE ar.admin_id = $1
        ORDER BY LOWER(r.name), r.id
        "#,
    )
    .bind(admin_id);
    let permissions = query_as::<_, PermissionRow>(
        r#"
        SELECT rp.role_id, p.id, p.name, p.description
        FROM admin_roles ar
        INNER JOIN role_permissions rp ON rp.role_id = ar.role_id
        INNER JOIN permissions p ON p.id = rp.permission_id
        WHERE ar.admin_id = $1 AND rp.is_active
        ORDER BY LOWER(p.name), p.id
        "#,
    )
    .bind(admin_id);

    let (roles, permissions) = try_join!(roles.fetch_all(pool), permissions.fetch_all(pool))
        .map_err(map_sqlx_error)?;

    let mut by_role: HashMap<Uuid, Vec<PermissionRecord>> = HashMap::new();
    for row in permissions {
        by_role
            .entry(row.role_id)
            .or_default()
            .push(PermissionRecord::from(row));
    }

    Ok(roles
        .into_iter()
        .map(|row| {
            let role = RoleRecord::from(row);
            RoleGrant {
                permissions: by_role.remove(&role.id).unwrap_or_default(),
                role,
            }
        })
        .collect())
}

#[async_trait]
impl SnapshotSource<StudentProfile> for PostgresRepositories {
    async fn load_snapshot(&self, user_id: Uuid) -> Result<Option<StudentProfile>, RepoError> {
        let mut qb = head_query(EntityKind::Student);
        qb.push(" AND s.user_id = ");
        qb.push_bind(user_id);
        let Some(head) = qb
            .build_query_as::<StudentListingRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
        else {
            return Ok(None);
        };

        let student_id = head.student.id();
        let owner = OwnerTables::from(ProfileOwner::Student(student_id));
        let pool = self.pool();
        let (skills, education, work_experience, profile_summary, documents) = try_join!(
            load_skills(pool, owner),
            load_education(pool, owner),
            load_work_experience(pool, owner),
            load_summary(pool, student_id),
            load_documents(pool, student_id),
        )?;

        let mut nysc_document = None;
        let mut valid_id_document = None;
        for document in documents {
            match document.kind {
                IdentityDocumentKind::Nysc => nysc_document = Some(document),
                IdentityDocumentKind::ValidId => valid_id_document = Some(document),
            }
        }

        Ok(Some(StudentProfile {
            student: head.student.into(),
            user: head.user.into(),
            category: head.category.into_category(),
            skills,
            education,
            work_experience,
            profile_summary,
            nysc_document,
            valid_id_document,
            professional_overview: head.overview.into_overview(),
        }))
    }
}

#[async_trait]
impl SnapshotSource<ServiceProviderProfile> for PostgresRepositories {
    async fn load_snapshot(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ServiceProviderProfile>, RepoError> {
        let mut qb = head_query(EntityKind::ServiceProvider);
        qb.push(" AND sp.user_id = ");
        qb.push_bind(user_id);
        let Some(head) = qb
            .build_query_as::<ServiceProviderListingRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
        else {
            return Ok(None);
        };

        let owner = OwnerTables::from(ProfileOwner::ServiceProvider(head.service_provider.id()));
        let pool = self.pool();
        let (skills, education, work_experience) = try_join!(
            load_skills(pool, owner),
            load_education(pool, owner),
            load_work_experience(pool, owner),
        )?;

        Ok(Some(ServiceProviderProfile {
            service_provider: head.service_provider.into(),
            user: head.user.into(),
            professional_overview: head.overview.into_overview(),
            skills,
            education,
            work_experience,
        }))
    }
}

#[async_trait]
impl SnapshotSource<AdminProfile> for PostgresRepositories {
    async fn load_snapshot(&self, user_id: Uuid) -> Result<Option<AdminProfile>, RepoError> {
        let mut qb = head_query(EntityKind::Admin);
        qb.push(" AND a.user_id = ");
        qb.push_bind(user_id);
        let Some(head) = qb
            .build_query_as::<AdminListingRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
        else {
            return Ok(None);
        };

        let roles = load_role_grants(self.pool(), head.admin.id()).await?;

        Ok(Some(AdminProfile {
            admin: head.admin.into(),
            user: head.user.into(),
            information: head.information.into_information(),
            roles,
        }))
    }
}
