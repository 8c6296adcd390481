use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::repos::{CatalogRepo, RepoError},
    domain::entities::{CategoryRecord, RoleRecord, SkillRecord},
};

use super::{
    PostgresRepositories, map_sqlx_error,
    rows::{CategoryRow, RoleRow, SkillRow},
};

impl PostgresRepositories {
    pub(super) async fn missing_ids(
        &self,
        lookup: MissingLookup,
        ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar::<_, Uuid>(lookup.sql())
            .bind(ids)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

#[derive(Clone, Copy)]
pub(super) enum MissingLookup {
    Skills,
    Roles,
    Permissions,
}

impl MissingLookup {
    fn sql(self) -> &'static str {
        match self {
            MissingLookup::Skills => {
                r#"
                SELECT wanted.id
                FROM UNNEST($1::uuid[]) AS wanted(id)
                LEFT JOIN skills s ON s.id = wanted.id
                WHERE s.id IS NULL
                "#
            }
            MissingLookup::Roles => {
                r#"
                SELECT wanted.id
                FROM UNNEST($1::uuid[]) AS wanted(id)
                LEFT JOIN roles r ON r.id = wanted.id
                WHERE r.id IS NULL
                "#
            }
            MissingLookup::Permissions => {
                r#"
                SELECT wanted.id
                FROM UNNEST($1::uuid[]) AS wanted(id)
                LEFT JOIN permissions p ON p.id = wanted.id
                WHERE p.id IS NULL
                "#
            }
        }
    }
}

#[async_trait]
impl CatalogRepo for PostgresRepositories {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, description, created_at
            FROM categories
            ORDER BY LOWER(name), id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }

    async fn list_skills(&self) -> Result<Vec<SkillRecord>, RepoError> {
        let rows = sqlx::query_as::<_, SkillRow>(
            r#"
            SELECT id, name, created_at
            FROM skills
            ORDER BY LOWER(name), id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SkillRecord::from).collect())
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>, RepoError> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description, created_at
            FROM roles
            ORDER BY LOWER(name), id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(RoleRecord::from).collect())
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, description, created_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CategoryRecord::from))
    }

    async fn missing_skills(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError> {
        self.missing_ids(MissingLookup::Skills, ids).await
    }

    async fn missing_roles(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError> {
        self.missing_ids(MissingLookup::Roles, ids).await
    }
}
