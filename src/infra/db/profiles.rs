use async_trait::async_trait;
use sqlx::{PgConnection, query, query_as};
use uuid::Uuid;

use crate::{
    application::repos::{
        NewEducation, NewWorkExperience, ProfessionalOverviewParams, ProfileOwner,
        ProfileWriteRepo, RepoError,
    },
    domain::entities::{EducationRecord, ProfessionalOverview, WorkExperienceRecord},
    domain::types::OnboardingStep,
};

use super::{
    PostgresRepositories, bounded, map_sqlx_error,
    rows::{EducationRow, OverviewRow, WorkExperienceRow},
};

/// Table and column names for rows owned by a student or service provider.
#[derive(Clone, Copy)]
pub(super) struct OwnerTables {
    pub(super) id: Uuid,
    /// Table holding the owner row itself.
    pub(super) table: &'static str,
    /// Foreign-key column pointing at the owner from child tables.
    pub(super) column: &'static str,
    pub(super) skills_table: &'static str,
}

impl From<ProfileOwner> for OwnerTables {
    fn from(owner: ProfileOwner) -> Self {
        match owner {
            ProfileOwner::Student(id) => Self {
                id,
                table: "students",
                column: "student_id",
                skills_table: "student_skills",
            },
            ProfileOwner::ServiceProvider(id) => Self {
                id,
                table: "service_providers",
                column: "service_provider_id",
                skills_table: "service_provider_skills",
            },
        }
    }
}

/// Records `step` as the owner's current onboarding step.
pub(super) async fn record_step(
    conn: &mut PgConnection,
    owner: OwnerTables,
    step: OnboardingStep,
) -> Result<(), RepoError> {
    let sql = format!(
        "UPDATE {} SET onboarding_step = $2, updated_at = now() WHERE id = $1",
        owner.table
    );
    let result = query(&sql)
        .bind(owner.id)
        .bind(step.ordinal())
        .execute(conn)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

/// Deletes row `id` of `table` when `owner` owns it; `NotFound` otherwise.
async fn delete_owned(
    conn: &mut PgConnection,
    table: &'static str,
    owner: OwnerTables,
    id: Uuid,
) -> Result<(), RepoError> {
    let sql = format!("DELETE FROM {table} WHERE id = $1 AND {} = $2", owner.column);
    let deleted = query(&sql)
        .bind(id)
        .bind(owner.id)
        .execute(conn)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();
    if deleted == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl ProfileWriteRepo for PostgresRepositories {
    async fn add_skills(&self, owner: ProfileOwner, skill_ids: &[Uuid]) -> Result<u64, RepoError> {
        let owner = OwnerTables::from(owner);
        bounded("add_skills", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let sql = format!(
                "INSERT INTO {} ({}, skill_id) SELECT $1, UNNEST($2::uuid[]) \
                 ON CONFLICT DO NOTHING",
                owner.skills_table, owner.column
            );
            let added = query(&sql)
                .bind(owner.id)
                .bind(skill_ids)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?
                .rows_affected();

            record_step(&mut tx, owner, OnboardingStep::Skills).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(added)
        })
        .await
    }

    async fn add_education(
        &self,
        owner: ProfileOwner,
        params: NewEducation,
    ) -> Result<EducationRecord, RepoError> {
        let owner = OwnerTables::from(owner);
        bounded("add_education", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let sql = format!(
                "INSERT INTO education \
                 ({}, institution, degree, field_of_study, start_date, end_date) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING id, institution, degree, field_of_study, start_date, end_date, \
                 created_at",
                owner.column
            );
            let row = query_as::<_, EducationRow>(&sql)
                .bind(owner.id)
                .bind(&params.institution)
                .bind(&params.degree)
                .bind(params.field_of_study.as_deref())
                .bind(params.start_date)
                .bind(params.end_date)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            record_step(&mut tx, owner, OnboardingStep::Education).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(EducationRecord::from(row))
        })
        .await
    }

    async fn update_education(
        &self,
        owner: ProfileOwner,
        education_id: Uuid,
        params: NewEducation,
    ) -> Result<EducationRecord, RepoError> {
        let owner = OwnerTables::from(owner);
        bounded("update_education", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let sql = format!(
                "UPDATE education SET institution = $3, degree = $4, field_of_study = $5, \
                 start_date = $6, end_date = $7 \
                 WHERE id = $1 AND {} = $2 \
                 RETURNING id, institution, degree, field_of_study, start_date, end_date, \
                 created_at",
                owner.column
            );
            let row = query_as::<_, EducationRow>(&sql)
                .bind(education_id)
                .bind(owner.id)
                .bind(&params.institution)
                .bind(&params.degree)
                .bind(params.field_of_study.as_deref())
                .bind(params.start_date)
                .bind(params.end_date)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?
                .ok_or(RepoError::NotFound)?;

            record_step(&mut tx, owner, OnboardingStep::Education).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(EducationRecord::from(row))
        })
        .await
    }

    async fn delete_education(
        &self,
        owner: ProfileOwner,
        education_id: Uuid,
    ) -> Result<(), RepoError> {
        let owner = OwnerTables::from(owner);
        bounded("delete_education", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;
            delete_owned(&mut tx, "education", owner, education_id).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(())
        })
        .await
    }

    async fn add_work_experience(
        &self,
        owner: ProfileOwner,
        params: NewWorkExperience,
    ) -> Result<WorkExperienceRecord, RepoError> {
        let owner = OwnerTables::from(owner);
        bounded("add_work_experience", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let sql = format!(
                "INSERT INTO work_experience \
                 ({}, company, title, employment_type, location, start_date, end_date, \
                 working_here, description) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 RETURNING id, company, title, employment_type, location, start_date, \
                 end_date, working_here, description, created_at",
                owner.column
            );
            let row = query_as::<_, WorkExperienceRow>(&sql)
                .bind(owner.id)
                .bind(&params.company)
                .bind(&params.title)
                .bind(params.employment_type.as_str())
                .bind(params.location.as_deref())
                .bind(params.start_date)
                .bind(params.end_date)
                .bind(params.working_here)
                .bind(params.description.as_deref())
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            record_step(&mut tx, owner, OnboardingStep::WorkExperience).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            WorkExperienceRecord::try_from(row)
        })
        .await
    }

    async fn update_work_experience(
        &self,
        owner: ProfileOwner,
        work_experience_id: Uuid,
        params: NewWorkExperience,
    ) -> Result<WorkExperienceRecord, RepoError> {
        let owner = OwnerTables::from(owner);
        bounded("update_work_experience", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let sql = format!(
                "UPDATE work_experience SET company = $3, title = $4, employment_type = $5, \
                 location = $6, start_date = $7, end_date = $8, working_here = $9, \
                 description = $10 \
                 WHERE id = $1 AND {} = $2 \
                 RETURNING id, company, title, employment_type, location, start_date, \
                 end_date, working_here, description, created_at",
                owner.column
            );
            let row = query_as::<_, WorkExperienceRow>(&sql)
                .bind(work_experience_id)
                .bind(owner.id)
                .bind(&params.company)
                .bind(&params.title)
                .bind(params.employment_type.as_str())
                .bind(params.location.as_deref())
                .bind(params.start_date)
                .bind(params.end_date)
                .bind(params.working_here)
                .bind(params.description.as_deref())
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?
                .ok_or(RepoError::NotFound)?;

            record_step(&mut tx, owner, OnboardingStep::WorkExperience).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            WorkExperienceRecord::try_from(row)
        })
        .await
    }

    async fn delete_work_experience(
        &self,
        owner: ProfileOwner,
        work_experience_id: Uuid,
    ) -> Result<(), RepoError> {
        let owner = OwnerTables::from(owner);
        bounded("delete_work_experience", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;
            delete_owned(&mut tx, "work_experience", owner, work_experience_id).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(())
        })
        .await
    }

    async fn upsert_professional_overview(
        &self,
        owner: ProfileOwner,
        params: ProfessionalOverviewParams,
    ) -> Result<ProfessionalOverview, RepoError> {
        let owner = OwnerTables::from(owner);
        bounded("upsert_professional_overview", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let sql = format!(
                "INSERT INTO professional_overviews \
                 ({column}, phone_number, address, city, state, country) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT ({column}) DO UPDATE SET \
                 phone_number = EXCLUDED.phone_number, address = EXCLUDED.address, \
                 city = EXCLUDED.city, state = EXCLUDED.state, country = EXCLUDED.country, \
                 updated_at = now() \
                 RETURNING id, phone_number, address, city, state, country, updated_at",
                column = owner.column
            );
            let row = query_as::<_, OverviewRow>(&sql)
                .bind(owner.id)
                .bind(params.phone_number.as_deref())
                .bind(params.address.as_deref())
                .bind(params.city.as_deref())
                .bind(params.state.as_deref())
                .bind(params.country.as_deref())
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            record_step(&mut tx, owner, OnboardingStep::PersonalData).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(ProfessionalOverview::from(row))
        })
        .await
    }
}
