use async_trait::async_trait;
use sqlx::{PgConnection, query};
use uuid::Uuid;

use crate::application::repos::{AdminWriteRepo, RepoError};

use super::{PostgresRepositories, bounded, map_sqlx_error};

async fn touch_admin(conn: &mut PgConnection, admin_id: Uuid) -> Result<(), RepoError> {
    let result = query("UPDATE admins SET updated_at = now() WHERE id = $1")
        .bind(admin_id)
        .execute(conn)
        .await
        .map_err(map_sqlx_error)?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl AdminWriteRepo for PostgresRepositories {
    async fn assign_roles(&self, admin_id: Uuid, role_ids: &[Uuid]) -> Result<u64, RepoError> {
        bounded("assign_roles", self.bulk_budget(), async {
            let mut tx = self.begin_serializable().await?;
            touch_admin(&mut tx, admin_id).await?;

            let added = query(
                r#"
                INSERT INTO admin_roles (admin_id, role_id)
                SELECT $1, UNNEST($2::uuid[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(admin_id)
            .bind(role_ids)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(added)
        })
        .await
    }

    async fn remove_roles(&self, admin_id: Uuid, role_ids: &[Uuid]) -> Result<u64, RepoError> {
        bounded("remove_roles", self.bulk_budget(), async {
            let mut tx = self.begin_serializable().await?;
            touch_admin(&mut tx, admin_id).await?;

            let removed = query("DELETE FROM admin_roles WHERE admin_id = $1 AND role_id = ANY($2)")
                .bind(admin_id)
                .bind(role_ids)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?
                .rows_affected();

            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(removed)
        })
        .await
    }

    async fn set_deleted(&self, admin_ids: &[Uuid], deleted: bool) -> Result<u64, RepoError> {
        bounded("set_deleted", self.bulk_budget(), async {
            let mut tx = self.begin_serializable().await?;

            let updated = query(
                "UPDATE admins SET deleted = $2, updated_at = now() WHERE id = ANY($1)",
            )
            .bind(admin_ids)
            .bind(deleted)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

            // Dropping the transaction rolls back a partial update.
            if updated != admin_ids.len() as u64 {
                return Err(RepoError::NotFound);
            }

            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(updated)
        })
        .await
    }
}
