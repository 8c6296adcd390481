//! Role and permission administration.
//!
//! Role names are stored lowercase and permission names uppercase. Writes
//! that change a role touch the snapshot of every admin holding it, since
//! admin snapshots embed their roles and permissions.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::admins::AdminError;
use crate::application::repos::{
    PermissionGrant, PermissionParams, RepoError, RoleAdminRepo, RoleChange, RoleParams,
};
use crate::application::snapshots::{Committed, EntityRef};
use crate::domain::entities::{PermissionRecord, RolePermission, RoleRecord};

const SOURCE: &str = "application::roles";

#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleAdminRepo>,
}

impl RoleService {
    pub fn new(roles: Arc<dyn RoleAdminRepo>) -> Self {
        Self { roles }
    }

    pub async fn create_role(&self, params: RoleParams) -> Result<Committed<RoleRecord>, AdminError> {
        let params = checked_role(params)?;

        let role = self.roles.create_role(params).await?;
        info!(target = SOURCE, role_id = %role.id, name = %role.name, "role created");
        Ok(Committed::new(role, Vec::new()))
    }

    pub async fn update_role(
        &self,
        role_id: Uuid,
        params: RoleParams,
    ) -> Result<Committed<RoleRecord>, AdminError> {
        let params = checked_role(params)?;

        let change = self
            .roles
            .update_role(role_id, params)
            .await
            .map_err(role_not_found)?;
        Ok(held_by(change))
    }

    pub async fn delete_role(&self, role_id: Uuid) -> Result<Committed<()>, AdminError> {
        let change = self.roles.delete_role(role_id).await.map_err(role_not_found)?;
        info!(
            target = SOURCE,
            %role_id,
            holders = change.holders.len(),
            "role deleted"
        );
        Ok(held_by(change))
    }

    pub async fn permissions(&self) -> Result<Vec<PermissionRecord>, AdminError> {
        Ok(self.roles.list_permissions().await?)
    }

    pub async fn create_permission(
        &self,
        params: PermissionParams,
    ) -> Result<Committed<PermissionRecord>, AdminError> {
        let name = params.name.trim().to_uppercase();
        if name.is_empty() {
            return Err(AdminError::InvalidArgument(
                "permission name is required".to_string(),
            ));
        }

        let permission = self
            .roles
            .create_permission(PermissionParams {
                name,
                description: optional(params.description),
            })
            .await?;
        info!(target = SOURCE, permission_id = %permission.id, "permission created");
        Ok(Committed::new(permission, Vec::new()))
    }

    /// Links permissions to a role; a permission listed twice keeps its
    /// first `is_active` flag. Returns how many links were added.
    pub async fn attach_permissions(
        &self,
        role_id: Uuid,
        grants: &[PermissionGrant],
    ) -> Result<Committed<u64>, AdminError> {
        let mut unique: Vec<PermissionGrant> = Vec::with_capacity(grants.len());
        for grant in grants {
            if !unique.iter().any(|seen| seen.permission_id == grant.permission_id) {
                unique.push(*grant);
            }
        }
        let ids = unique.iter().map(|grant| grant.permission_id).collect::<Vec<_>>();
        self.checked_permissions(&ids).await?;

        let change = self
            .roles
            .attach_permissions(role_id, &unique)
            .await
            .map_err(role_not_found)?;
        Ok(held_by(change))
    }

    pub async fn detach_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Committed<u64>, AdminError> {
        let mut ids = permission_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Err(AdminError::InvalidArgument(
                "at least one permission is required".to_string(),
            ));
        }

        let change = self
            .roles
            .detach_permissions(role_id, &ids)
            .await
            .map_err(role_not_found)?;
        Ok(held_by(change))
    }

    pub async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<RolePermission>, AdminError> {
        self.roles
            .role_permissions(role_id)
            .await
            .map_err(role_not_found)
    }

    async fn checked_permissions(&self, ids: &[Uuid]) -> Result<(), AdminError> {
        if ids.is_empty() {
            return Err(AdminError::InvalidArgument(
                "at least one permission is required".to_string(),
            ));
        }
        if !self.roles.missing_permissions(ids).await?.is_empty() {
            return Err(AdminError::NotFound("permission"));
        }
        Ok(())
    }
}

fn checked_role(params: RoleParams) -> Result<RoleParams, AdminError> {
    let name = params.name.trim().to_lowercase();
    if name.is_empty() {
        return Err(AdminError::InvalidArgument("role name is required".to_string()));
    }
    Ok(RoleParams {
        name,
        description: optional(params.description),
    })
}

fn optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn held_by<T>(change: RoleChange<T>) -> Committed<T> {
    let touched = change.holders.into_iter().map(EntityRef::admin).collect();
    Committed::new(change.value, touched)
}

fn role_not_found(err: RepoError) -> AdminError {
    match err {
        RepoError::NotFound => AdminError::NotFound("role"),
        other => AdminError::Repo(other),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;

    #[derive(Default)]
    struct Roles {
        roles: HashMap<Uuid, RoleRecord>,
        permissions: HashMap<Uuid, PermissionRecord>,
        links: HashMap<(Uuid, Uuid), bool>,
        holders: HashMap<Uuid, Vec<Uuid>>,
    }

    #[derive(Default)]
    struct FakeRoles {
        state: Mutex<Roles>,
    }

    impl FakeRoles {
        fn state(&self) -> std::sync::MutexGuard<'_, Roles> {
            self.state.lock().expect("roles lock")
        }

        fn add_role(&self, holders: &[Uuid]) -> Uuid {
            let id = Uuid::new_v4();
            let mut state = self.state();
            state.roles.insert(
                id,
                RoleRecord {
                    id,
                    name: "reviewer".into(),
                    description: None,
                    created_at: OffsetDateTime::UNIX_EPOCH,
                },
            );
            state.holders.insert(id, holders.to_vec());
            id
        }

        fn add_permission(&self) -> Uuid {
            let id = Uuid::new_v4();
            self.state().permissions.insert(
                id,
                PermissionRecord {
                    id,
                    name: "APPROVE_APPLICANTS".into(),
                    description: None,
                },
            );
            id
        }

        fn change<T>(state: &Roles, role_id: Uuid, value: T) -> Result<RoleChange<T>, RepoError> {
            let holders = state.holders.get(&role_id).cloned().ok_or(RepoError::NotFound)?;
            Ok(RoleChange { value, holders })
        }
    }

    #[async_trait]
    impl RoleAdminRepo for FakeRoles {
        async fn create_role(&self, params: RoleParams) -> Result<RoleRecord, RepoError> {
            let mut state = self.state();
            if state.roles.values().any(|role| role.name == params.name) {
                return Err(RepoError::Duplicate {
                    constraint: "roles_name_key".into(),
                });
            }
            let role = RoleRecord {
                id: Uuid::new_v4(),
                name: params.name,
                description: params.description,
                created_at: OffsetDateTime::UNIX_EPOCH,
            };
            state.roles.insert(role.id, role.clone());
            state.holders.insert(role.id, Vec::new());
            Ok(role)
        }

        async fn update_role(
            &self,
            role_id: Uuid,
            params: RoleParams,
        ) -> Result<RoleChange<RoleRecord>, RepoError> {
            let mut state = self.state();
            let role = state.roles.get_mut(&role_id).ok_or(RepoError::NotFound)?;
            role.name = params.name;
            role.description = params.description;
            let role = role.clone();
            Self::change(&state, role_id, role)
        }

        async fn delete_role(&self, role_id: Uuid) -> Result<RoleChange<()>, RepoError> {
            let mut state = self.state();
            let change = Self::change(&state, role_id, ())?;
            state.roles.remove(&role_id);
            state.holders.remove(&role_id);
            Ok(change)
        }

        async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, RepoError> {
            Ok(self.state().permissions.values().cloned().collect())
        }

        async fn create_permission(
            &self,
            params: PermissionParams,
        ) -> Result<PermissionRecord, RepoError> {
            let permission = PermissionRecord {
                id: Uuid::new_v4(),
                name: params.name,
                description: params.description,
            };
            self.state()
                .permissions
                .insert(permission.id, permission.clone());
            Ok(permission)
        }

        async fn missing_permissions(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError> {
            let state = self.state();
            Ok(ids
                .iter()
                .copied()
                .filter(|id| !state.permissions.contains_key(id))
                .collect())
        }

        async fn attach_permissions(
            &self,
            role_id: Uuid,
            grants: &[PermissionGrant],
        ) -> Result<RoleChange<u64>, RepoError> {
            let mut state = self.state();
            Self::change(&state, role_id, ())?;
            let mut added = 0;
            for grant in grants {
                let key = (role_id, grant.permission_id);
                if !state.links.contains_key(&key) {
                    state.links.insert(key, grant.is_active);
                    added += 1;
                }
            }
            Self::change(&state, role_id, added)
        }

        async fn detach_permissions(
            &self,
            role_id: Uuid,
            permission_ids: &[Uuid],
        ) -> Result<RoleChange<u64>, RepoError> {
            let mut state = self.state();
            Self::change(&state, role_id, ())?;
            let removed = permission_ids
                .iter()
                .filter(|id| state.links.remove(&(role_id, **id)).is_some())
                .count() as u64;
            Self::change(&state, role_id, removed)
        }

        async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<RolePermission>, RepoError> {
            let state = self.state();
            if !state.roles.contains_key(&role_id) {
                return Err(RepoError::NotFound);
            }
            Ok(state
                .links
                .iter()
                .filter(|((role, _), _)| *role == role_id)
                .filter_map(|((_, permission_id), is_active)| {
                    state.permissions.get(permission_id).map(|permission| RolePermission {
                        permission: permission.clone(),
                        is_active: *is_active,
                    })
                })
                .collect())
        }
    }

    fn service(store: &Arc<FakeRoles>) -> RoleService {
        RoleService::new(store.clone())
    }

    #[tokio::test]
    async fn role_names_are_normalized_and_unique() {
        let store = Arc::new(FakeRoles::default());
        let service = service(&store);

        let role = service
            .create_role(RoleParams {
                name: "  Reviewer ".into(),
                description: Some(" ".into()),
            })
            .await
            .expect("create")
            .into_value();
        assert_eq!(role.name, "reviewer");
        assert_eq!(role.description, None);

        let err = service
            .create_role(RoleParams {
                name: "REVIEWER".into(),
                description: None,
            })
            .await
            .expect_err("duplicate");
        assert!(matches!(err, AdminError::Repo(RepoError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn updating_a_role_touches_its_holders() {
        let store = Arc::new(FakeRoles::default());
        let holder = Uuid::new_v4();
        let role_id = store.add_role(&[holder]);

        let committed = service(&store)
            .update_role(
                role_id,
                RoleParams {
                    name: "Approver".into(),
                    description: None,
                },
            )
            .await
            .expect("update");

        assert_eq!(committed.touched(), &[EntityRef::admin(holder)]);
        assert_eq!(committed.into_value().name, "approver");
    }

    #[tokio::test]
    async fn unknown_role_is_not_found() {
        let store = Arc::new(FakeRoles::default());
        let service = service(&store);

        let err = service.delete_role(Uuid::new_v4()).await.expect_err("missing");
        assert!(matches!(err, AdminError::NotFound("role")));

        let err = service
            .role_permissions(Uuid::new_v4())
            .await
            .expect_err("missing");
        assert!(matches!(err, AdminError::NotFound("role")));
    }

    #[tokio::test]
    async fn permissions_attach_once_and_detach() {
        let store = Arc::new(FakeRoles::default());
        let role_id = store.add_role(&[]);
        let permission_id = store.add_permission();
        let service = service(&store);
        let grant = PermissionGrant {
            permission_id,
            is_active: false,
        };

        let added = service
            .attach_permissions(role_id, &[grant, PermissionGrant { is_active: true, ..grant }])
            .await
            .expect("attach")
            .into_value();
        assert_eq!(added, 1);

        let linked = service.role_permissions(role_id).await.expect("list");
        assert_eq!(linked.len(), 1);
        assert!(!linked[0].is_active);

        let again = service
            .attach_permissions(role_id, &[grant])
            .await
            .expect("attach again")
            .into_value();
        assert_eq!(again, 0);

        let removed = service
            .detach_permissions(role_id, &[permission_id, permission_id])
            .await
            .expect("detach")
            .into_value();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn unknown_permission_is_rejected_before_writing() {
        let store = Arc::new(FakeRoles::default());
        let role_id = store.add_role(&[]);

        let err = service(&store)
            .attach_permissions(
                role_id,
                &[PermissionGrant {
                    permission_id: Uuid::new_v4(),
                    is_active: true,
                }],
            )
            .await
            .expect_err("unknown permission");

        assert!(matches!(err, AdminError::NotFound("permission")));
        assert!(store.state().links.is_empty());
    }

    #[tokio::test]
    async fn permission_names_are_uppercased() {
        let store = Arc::new(FakeRoles::default());

        let permission = service(&store)
            .create_permission(PermissionParams {
                name: "view_applicants".into(),
                description: None,
            })
            .await
            .expect("create")
            .into_value();

        assert_eq!(permission.name, "VIEW_APPLICANTS");
    }
}
