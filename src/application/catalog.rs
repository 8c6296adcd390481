//! Read-only lookups of categories, skills and roles.

use std::sync::Arc;

use crate::application::repos::{CatalogRepo, RepoError};
use crate::domain::entities::{CategoryRecord, RoleRecord, SkillRecord};

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepo>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepo>) -> Self {
        Self { repo }
    }

    pub async fn categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        self.repo.list_categories().await
    }

    pub async fn skills(&self) -> Result<Vec<SkillRecord>, RepoError> {
        self.repo.list_skills().await
    }

    pub async fn roles(&self) -> Result<Vec<RoleRecord>, RepoError> {
        self.repo.list_roles().await
    }
}
