//! Postgres-backed repository implementations.

mod accounts;
mod admins;
mod catalog;
mod listing;
mod profiles;
mod roles;
mod rows;
mod snapshots;
mod students;
mod util;

pub use util::map_sqlx_error;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    Postgres, Transaction,
    postgres::{PgPool, PgPoolOptions},
    query,
};
use tracing::warn;

use crate::application::repos::{HealthRepo, RepoError};
use crate::config::{DatabaseSettings, TransactionSettings};

const SOURCE: &str = "infra::db";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
    budgets: TransactionSettings,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool, budgets: TransactionSettings) -> Self {
        Self {
            pool: Arc::new(pool),
            budgets,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(settings.max_connections.get())
            .acquire_timeout(settings.acquire_timeout)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// Opens a transaction at SERIALIZABLE isolation.
    ///
    /// Dropping the returned transaction without committing rolls it back.
    async fn begin_serializable(&self) -> Result<Transaction<'_, Postgres>, RepoError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(tx)
    }

    fn default_budget(&self) -> Duration {
        self.budgets.default_timeout
    }

    fn upload_budget(&self) -> Duration {
        self.budgets.upload_timeout
    }

    fn bulk_budget(&self) -> Duration {
        self.budgets.bulk_timeout
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}

/// Runs `work` under a wall-clock budget.
///
/// When the budget elapses the future is dropped, which rolls back any open
/// transaction it owns.
async fn bounded<T, F>(operation: &'static str, budget: Duration, work: F) -> Result<T, RepoError>
where
    F: Future<Output = Result<T, RepoError>>,
{
    match tokio::time::timeout(budget, work).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                target = SOURCE,
                operation,
                budget_ms = budget.as_millis() as u64,
                "transaction exceeded its budget and was rolled back"
            );
            Err(RepoError::Timeout)
        }
    }
}

#[async_trait]
impl HealthRepo for PostgresRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}
