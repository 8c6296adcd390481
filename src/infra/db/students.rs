use async_trait::async_trait;
use sqlx::{query, query_as};
use tracing::debug;
use uuid::Uuid;

use crate::{
    application::repos::{
        CompletionOutcome, MissingPart, ProfileOwner, RepoError, StoredDocument,
        StudentWriteRepo,
    },
    domain::entities::{ProfileSummary, StudentRecord},
    domain::types::OnboardingStep,
};

use super::{
    PostgresRepositories, bounded, map_sqlx_error,
    profiles::{OwnerTables, record_step},
    rows::{ProfileSummaryRow, StudentRow},
};

const SOURCE: &str = "infra::db::students";

#[derive(sqlx::FromRow)]
struct CompletionRow {
    has_skills: bool,
    has_education: bool,
    has_work_experience: bool,
    has_valid_id: bool,
}

impl CompletionRow {
    fn missing(&self) -> Vec<MissingPart> {
        [
            (self.has_skills, MissingPart::Skills),
            (self.has_education, MissingPart::Education),
            (self.has_work_experience, MissingPart::WorkExperience),
            (self.has_valid_id, MissingPart::ValidId),
        ]
        .into_iter()
        .filter_map(|(present, part)| (!present).then_some(part))
        .collect()
    }
}

#[async_trait]
impl StudentWriteRepo for PostgresRepositories {
    async fn select_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<StudentRecord, RepoError> {
        bounded("select_category", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let row = query_as::<_, StudentRow>(
                r#"
                INSERT INTO students (user_id, category_id, onboarding_step)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id) DO UPDATE SET
                    category_id = EXCLUDED.category_id,
                    onboarding_step = EXCLUDED.onboarding_step,
                    updated_at = now()
                RETURNING id, user_id, category_id, onboarding_step, onboarding_complete,
                          created_at, updated_at
                "#,
            )
            .bind(user_id)
            .bind(category_id)
            .bind(OnboardingStep::Category.ordinal())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(StudentRecord::from(row))
        })
        .await
    }

    async fn upsert_identity_documents(
        &self,
        student_id: Uuid,
        documents: &[StoredDocument],
    ) -> Result<(), RepoError> {
        bounded("upsert_identity_documents", self.upload_budget(), async {
            let mut tx = self.begin_serializable().await?;

            for document in documents {
                query(
                    r#"
                    INSERT INTO identity_documents
                        (student_id, kind, public_id, url, format, original_filename)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (student_id, kind) DO UPDATE SET
                        public_id = EXCLUDED.public_id,
                        url = EXCLUDED.url,
                        format = EXCLUDED.format,
                        original_filename = EXCLUDED.original_filename,
                        uploaded_at = now()
                    "#,
                )
                .bind(student_id)
                .bind(document.kind.as_str())
                .bind(&document.public_id)
                .bind(&document.url)
                .bind(document.format.as_deref())
                .bind(document.original_filename.as_deref())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            }

            let owner = OwnerTables::from(ProfileOwner::Student(student_id));
            record_step(&mut tx, owner, OnboardingStep::IdentityDocuments).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(())
        })
        .await
    }

    async fn save_profile_summary(
        &self,
        student_id: Uuid,
        summary: &str,
    ) -> Result<ProfileSummary, RepoError> {
        bounded("save_profile_summary", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let row = query_as::<_, ProfileSummaryRow>(
                r#"
                INSERT INTO profile_summaries (student_id, summary)
                VALUES ($1, $2)
                ON CONFLICT (student_id) DO UPDATE SET
                    summary = EXCLUDED.summary,
                    updated_at = now()
                RETURNING id, summary, updated_at
                "#,
            )
            .bind(student_id)
            .bind(summary)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            let owner = OwnerTables::from(ProfileOwner::Student(student_id));
            record_step(&mut tx, owner, OnboardingStep::ProfileSummary).await?;
            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(ProfileSummary::from(row))
        })
        .await
    }

    async fn complete_onboarding(&self, student_id: Uuid) -> Result<CompletionOutcome, RepoError> {
        bounded("complete_onboarding", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let row = query_as::<_, CompletionRow>(
                r#"
                SELECT
                    EXISTS (SELECT 1 FROM student_skills WHERE student_id = $1) AS has_skills,
                    EXISTS (SELECT 1 FROM education WHERE student_id = $1) AS has_education,
                    EXISTS (SELECT 1 FROM work_experience WHERE student_id = $1)
                        AS has_work_experience,
                    EXISTS (
                        SELECT 1 FROM identity_documents
                        WHERE student_id = $1 AND kind = 'valid_id'
                    ) AS has_valid_id
                "#,
            )
            .bind(student_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            let missing = row.missing();
            if !missing.is_empty() {
                tx.rollback().await.map_err(map_sqlx_error)?;
                debug!(
                    target = SOURCE,
                    %student_id,
                    missing = missing.len(),
                    "onboarding completion refused"
                );
                return Ok(CompletionOutcome::Missing(missing));
            }

            let updated = query(
                "UPDATE students SET onboarding_complete = TRUE, updated_at = now() WHERE id = $1",
            )
            .bind(student_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
            if updated == 0 {
                return Err(RepoError::NotFound);
            }

            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(CompletionOutcome::Completed)
        })
        .await
    }
}
