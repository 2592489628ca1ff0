//! Persistence for submitted applications.
//!
//! The HTTP layer talks to an [`ApplicationStore`] so it can be exercised
//! against [`mock::MemoryApplicationStore`] without a database. Production
//! uses [`Storage`], which owns the Postgres pool for the lifetime of the
//! process: created once at startup, injected into the router, and closed
//! during shutdown.

use std::{future::Future, pin::Pin, sync::Arc};

use sqlx::PgPool;
use tracing::debug;

pub mod applications;
pub mod mock;

use crate::{
    error::Result,
    models::{Application, NewApplication},
};

/// Operations the intake handler needs from a store.
pub trait ApplicationStore: Send + Sync + 'static {
    /// Persists one application. Exactly one write per call.
    fn insert(
        &self,
        application: NewApplication,
    ) -> Pin<Box<dyn Future<Output = Result<Application>> + Send + '_>>;

    /// Verifies the store is reachable.
    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Postgres-backed storage container.
#[derive(Clone)]
pub struct Storage {
    /// Repository for application records.
    pub applications: Arc<applications::Repository>,
}

impl Storage {
    /// Creates a new storage instance with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);

        Self { applications: Arc::new(applications::Repository::new(pool)) }
    }

    /// Creates the `applications` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the DDL cannot be executed.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS applications (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            ",
        )
        .execute(&*self.applications.pool())
        .await?;

        debug!("applications table ready");
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.applications.pool().close().await;
    }

    /// Performs a health check on the database connection.
    ///
    /// # Errors
    ///
    /// Returns error if the connection is unhealthy.
    pub async fn ping(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.applications.pool()).await?;

        Ok(())
    }
}

impl ApplicationStore for Storage {
    fn insert(
        &self,
        application: NewApplication,
    ) -> Pin<Box<dyn Future<Output = Result<Application>> + Send + '_>> {
        Box::pin(async move { self.applications.create(&application).await })
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.ping())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn storage_can_be_created() {
        let pool = sqlx::PgPool::connect_lazy("postgresql://test").unwrap();
        let storage = Storage::new(pool);
        let _store: Arc<dyn ApplicationStore> = Arc::new(storage);
    }
}
