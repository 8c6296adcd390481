use async_trait::async_trait;
use sqlx::{PgConnection, query, query_as, query_scalar};
use uuid::Uuid;

use crate::application::repos::{
    PermissionGrant, PermissionParams, RepoError, RoleAdminRepo, RoleChange, RoleParams,
};
use crate::domain::entities::{PermissionRecord, RolePermission, RoleRecord};

use super::{
    PostgresRepositories, bounded,
    catalog::MissingLookup,
    map_sqlx_error,
    rows::{RolePermissionRow, RoleRow},
};

/// Locks the role row; `NotFound` when it does not exist.
async fn lock_role(conn: &mut PgConnection, role_id: Uuid) -> Result<(), RepoError> {
    query_scalar::<_, Uuid>("SELECT id FROM roles WHERE id = $1 FOR UPDATE")
        .bind(role_id)
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx_error)?
        .map(|_| ())
        .ok_or(RepoError::NotFound)
}

fn permission_record((id, name, description): (Uuid, String, Option<String>)) -> PermissionRecord {
    PermissionRecord {
        id,
        name,
        description,
    }
}

/// User ids of the admins holding `role_id`.
async fn holders(conn: &mut PgConnection, role_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
    query_scalar::<_, Uuid>(
        r#"
        SELECT a.user_id
        FROM admin_roles ar
        INNER JOIN admins a ON a.id = ar.admin_id
        WHERE ar.role_id = $1
        "#,
    )
    .bind(role_id)
    .fetch_all(conn)
    .await
    .map_err(map_sqlx_error)
}

#[async_trait]
impl RoleAdminRepo for PostgresRepositories {
    async fn create_role(&self, params: RoleParams) -> Result<RoleRecord, RepoError> {
        let row = query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(&params.name)
        .bind(&params.description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_role(
        &self,
        role_id: Uuid,
        params: RoleParams,
    ) -> Result<RoleChange<RoleRecord>, RepoError> {
        bounded("update_role", self.default_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let row = query_as::<_, RoleRow>(
                r#"
                UPDATE roles SET name = $2, description = $3
                WHERE id = $1
                RETURNING id, name, description, created_at
                "#,
            )
            .bind(role_id)
            .bind(&params.name)
            .bind(&params.description)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;
            let holders = holders(&mut tx, role_id).await?;

            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(RoleChange {
                value: row.into(),
                holders,
            })
        })
        .await
    }

    async fn delete_role(&self, role_id: Uuid) -> Result<RoleChange<()>, RepoError> {
        bounded("delete_role", self.bulk_budget(), async {
            let mut tx = self.begin_serializable().await?;
            lock_role(&mut tx, role_id).await?;
            // Read before the cascade drops the admin_roles rows.
            let holders = holders(&mut tx, role_id).await?;

            query("DELETE FROM roles WHERE id = $1")
                .bind(role_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(RoleChange { value: (), holders })
        })
        .await
    }

    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, RepoError> {
        let rows = query_as::<_, (Uuid, String, Option<String>)>(
            "SELECT id, name, description FROM permissions ORDER BY name, id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(permission_record).collect())
    }

    async fn create_permission(
        &self,
        params: PermissionParams,
    ) -> Result<PermissionRecord, RepoError> {
        let row = query_as::<_, (Uuid, String, Option<String>)>(
            r#"
            INSERT INTO permissions (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(&params.name)
        .bind(&params.description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(permission_record(row))
    }

    async fn missing_permissions(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError> {
        self.missing_ids(MissingLookup::Permissions, ids).await
    }

    async fn attach_permissions(
        &self,
        role_id: Uuid,
        grants: &[PermissionGrant],
    ) -> Result<RoleChange<u64>, RepoError> {
        let (ids, flags): (Vec<Uuid>, Vec<bool>) = grants
            .iter()
            .map(|grant| (grant.permission_id, grant.is_active))
            .unzip();

        bounded("attach_permissions", self.bulk_budget(), async {
            let mut tx = self.begin_serializable().await?;
            lock_role(&mut tx, role_id).await?;

            let added = query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id, is_active)
                SELECT $1, granted.permission_id, granted.is_active
                FROM UNNEST($2::uuid[], $3::bool[]) AS granted(permission_id, is_active)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(&ids)
            .bind(&flags)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
            let holders = holders(&mut tx, role_id).await?;

            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(RoleChange {
                value: added,
                holders,
            })
        })
        .await
    }

    async fn detach_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<RoleChange<u64>, RepoError> {
        bounded("detach_permissions", self.bulk_budget(), async {
            let mut tx = self.begin_serializable().await?;
            lock_role(&mut tx, role_id).await?;

            let removed = query(
                "DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = ANY($2)",
            )
            .bind(role_id)
            .bind(permission_ids)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
            let holders = holders(&mut tx, role_id).await?;

            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(RoleChange {
                value: removed,
                holders,
            })
        })
        .await
    }

    async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<RolePermission>, RepoError> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx_error)?;
        let exists: bool = query_scalar("SELECT EXISTS (SELECT 1 FROM roles WHERE id = $1)")
            .bind(role_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
        if !exists {
            return Err(RepoError::NotFound);
        }

        let rows = query_as::<_, RolePermissionRow>(
            r#"
            SELECT p.id, p.name, p.description, rp.is_active
            FROM role_permissions rp
            INNER JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.name, p.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(RolePermission::from).collect())
    }
}
