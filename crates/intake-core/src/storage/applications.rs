//! Repository for application records.
//!
//! Create-only: the service inserts applications and never reads them back
//! on the request path. [`Repository::count`] exists for operators and
//! tests.

use std::sync::Arc;

use sqlx::{Executor, PgPool, Postgres, Transaction};

use crate::{
    error::Result,
    models::{Application, ApplicationId, NewApplication},
};

/// Repository for application database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Inserts one application and returns the stored record.
    ///
    /// Values are bound as parameters. The id is generated here and
    /// `created_at` is set by the database.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails or is rejected.
    pub async fn create(&self, application: &NewApplication) -> Result<Application> {
        self.create_impl(&*self.pool, application).await
    }

    /// Inserts one application within a transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails or is rejected.
    pub async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        application: &NewApplication,
    ) -> Result<Application> {
        self.create_impl(&mut **tx, application).await
    }

    async fn create_impl<'e, E>(
        &self,
        executor: E,
        application: &NewApplication,
    ) -> Result<Application>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stored = sqlx::query_as::<_, Application>(
            r"
            INSERT INTO applications (id, name, email, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, message, created_at
            ",
        )
        .bind(ApplicationId::new())
        .bind(application.name())
        .bind(application.email())
        .bind(application.message())
        .fetch_one(executor)
        .await?;

        Ok(stored)
    }

    /// Counts stored applications.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
