//! In-memory store for exercising the HTTP layer without a database.
//!
//! Supports injecting insert failures so the server-error path can be
//! driven deterministically.

use std::{future::Future, pin::Pin, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::ApplicationStore;
use crate::{
    error::{Result, StorageError},
    models::{Application, ApplicationId, NewApplication},
    time::{Clock, RealClock},
};

/// Vector-backed [`ApplicationStore`].
#[derive(Debug, Clone)]
pub struct MemoryApplicationStore {
    applications: Arc<RwLock<Vec<Application>>>,
    insert_error: Arc<RwLock<Option<StorageError>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryApplicationStore {
    /// Creates an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(RealClock::new()))
    }

    /// Creates an empty store stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            applications: Arc::new(RwLock::new(Vec::new())),
            insert_error: Arc::new(RwLock::new(None)),
            clock,
        }
    }

    /// Makes every following insert fail with `error`.
    pub async fn fail_inserts_with(&self, error: StorageError) {
        *self.insert_error.write().await = Some(error);
    }

    /// Lets inserts succeed again.
    pub async fn clear_failure(&self) {
        *self.insert_error.write().await = None;
    }

    /// Returns a snapshot of every stored application, in insert order.
    pub async fn applications(&self) -> Vec<Application> {
        self.applications.read().await.clone()
    }

    /// Number of stored applications.
    pub async fn len(&self) -> usize {
        self.applications.read().await.len()
    }

    /// Whether nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.applications.read().await.is_empty()
    }
}

impl Default for MemoryApplicationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationStore for MemoryApplicationStore {
    fn insert(
        &self,
        application: NewApplication,
    ) -> Pin<Box<dyn Future<Output = Result<Application>> + Send + '_>> {
        Box::pin(async move {
            if let Some(error) = self.insert_error.read().await.clone() {
                return Err(error);
            }

            let created_at = DateTime::<Utc>::from(self.clock.now_system());
            let stored = Application::from_new(application, ApplicationId::new(), created_at);
            self.applications.write().await.push(stored.clone());
            Ok(stored)
        })
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            match self.insert_error.read().await.clone() {
                Some(StorageError::Unavailable(message)) => Err(StorageError::Unavailable(message)),
                _ => Ok(()),
            }
        })
    }
}
