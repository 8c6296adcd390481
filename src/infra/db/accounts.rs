use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::repos::{AccountsRepo, RepoError},
    domain::entities::{AdminRecord, ServiceProviderRecord, StudentRecord},
};

use super::{
    PostgresRepositories, map_sqlx_error,
    rows::{AdminRow, ServiceProviderRow, StudentRow},
};

#[async_trait]
impl AccountsRepo for PostgresRepositories {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_student(&self, user_id: Uuid) -> Result<Option<StudentRecord>, RepoError> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, user_id, category_id, onboarding_step, onboarding_complete,
                   created_at, updated_at
            FROM students
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(StudentRecord::from))
    }

    async fn find_service_provider(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ServiceProviderRecord>, RepoError> {
        let row = sqlx::query_as::<_, ServiceProviderRow>(
            r#"
            SELECT id, user_id, onboarding_step, created_at, updated_at
            FROM service_providers
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ServiceProviderRecord::from))
    }

    async fn find_admin(&self, user_id: Uuid) -> Result<Option<AdminRecord>, RepoError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT id, user_id, deleted, created_at, updated_at
            FROM admins
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AdminRecord::from))
    }

    async fn find_admins(&self, user_ids: &[Uuid]) -> Result<Vec<AdminRecord>, RepoError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT id, user_id, deleted, created_at, updated_at
            FROM admins
            WHERE user_id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AdminRecord::from).collect())
    }
}
