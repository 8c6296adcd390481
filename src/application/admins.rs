//! Role grants and soft deletion of admin accounts.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{AccountsRepo, AdminWriteRepo, CatalogRepo, RepoError};
use crate::application::snapshots::{Committed, EntityRef};
use crate::domain::entities::AdminRecord;

const SOURCE: &str = "application::admins";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct AdminService {
    accounts: Arc<dyn AccountsRepo>,
    catalog: Arc<dyn CatalogRepo>,
    writer: Arc<dyn AdminWriteRepo>,
}

impl AdminService {
    pub fn new(
        accounts: Arc<dyn AccountsRepo>,
        catalog: Arc<dyn CatalogRepo>,
        writer: Arc<dyn AdminWriteRepo>,
    ) -> Self {
        Self {
            accounts,
            catalog,
            writer,
        }
    }

    /// Grants roles the admin does not already hold; returns how many were added.
    pub async fn assign_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<Committed<u64>, AdminError> {
        let role_ids = self.checked_roles(role_ids).await?;
        let admin = self.admin(user_id).await?;

        let added = self.writer.assign_roles(admin.id, &role_ids).await?;
        info!(target = SOURCE, %user_id, added, "roles assigned");
        Ok(Committed::new(added, vec![EntityRef::admin(user_id)]))
    }

    pub async fn remove_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<Committed<u64>, AdminError> {
        let role_ids = self.checked_roles(role_ids).await?;
        let admin = self.admin(user_id).await?;

        let removed = self.writer.remove_roles(admin.id, &role_ids).await?;
        info!(target = SOURCE, %user_id, removed, "roles removed");
        Ok(Committed::new(removed, vec![EntityRef::admin(user_id)]))
    }

    /// Soft-deletes every listed admin, or none of them.
    pub async fn delete_admins(&self, user_ids: &[Uuid]) -> Result<Committed<u64>, AdminError> {
        let user_ids = unique(user_ids);
        if user_ids.is_empty() {
            return Err(AdminError::InvalidArgument(
                "at least one admin is required".to_string(),
            ));
        }

        let admins = self.accounts.find_admins(&user_ids).await?;
        if admins.len() != user_ids.len() {
            return Err(AdminError::NotFound("admin"));
        }

        let admin_ids = admins.iter().map(|admin| admin.id).collect::<Vec<_>>();
        let deleted = self
            .writer
            .set_deleted(&admin_ids, true)
            .await
            .map_err(not_found_as_admin)?;
        info!(target = SOURCE, deleted, "admins deleted");

        let touched = admins
            .iter()
            .map(|admin| EntityRef::admin(admin.user_id))
            .collect();
        Ok(Committed::new(deleted, touched))
    }

    /// Clears the deleted flag. Only a deleted admin can be restored.
    pub async fn restore_admin(&self, user_id: Uuid) -> Result<Committed<()>, AdminError> {
        let admin = self.admin(user_id).await?;
        if !admin.deleted {
            return Err(AdminError::InvalidArgument(
                "This account is not deleted".to_string(),
            ));
        }

        self.writer
            .set_deleted(&[admin.id], false)
            .await
            .map_err(not_found_as_admin)?;
        info!(target = SOURCE, %user_id, "admin restored");
        Ok(Committed::new((), vec![EntityRef::admin(user_id)]))
    }

    async fn admin(&self, user_id: Uuid) -> Result<AdminRecord, AdminError> {
        self.accounts
            .find_admin(user_id)
            .await?
            .ok_or(AdminError::NotFound("admin"))
    }

    async fn checked_roles(&self, role_ids: &[Uuid]) -> Result<Vec<Uuid>, AdminError> {
        let role_ids = unique(role_ids);
        if role_ids.is_empty() {
            return Err(AdminError::InvalidArgument(
                "at least one role is required".to_string(),
            ));
        }
        if !self.catalog.missing_roles(&role_ids).await?.is_empty() {
            return Err(AdminError::NotFound("role"));
        }
        Ok(role_ids)
    }
}

fn unique(ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn not_found_as_admin(err: RepoError) -> AdminError {
    match err {
        RepoError::NotFound => AdminError::NotFound("admin"),
        other => AdminError::Repo(other),
    }
}
