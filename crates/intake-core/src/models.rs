//! Application records and their identifiers.
//!
//! An application moves through exactly two shapes: a [`NewApplication`]
//! that has passed validation but has no identity yet, and an
//! [`Application`] returned by the store once the insert is acknowledged.
//! Records are never updated or deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Strongly-typed application identifier, assigned by the store.
///
/// # Example
///
/// ```
/// use intake_core::models::ApplicationId;
/// let id = ApplicationId::new();
/// println!("Stored application {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    /// Creates a new random application ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ApplicationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl sqlx::Type<PgDb> for ApplicationId {
    fn type_info() -> PgTypeInfo {
        <Uuid as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for ApplicationId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let uuid = <Uuid as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(uuid))
    }
}

impl sqlx::Encode<'_, PgDb> for ApplicationId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <Uuid as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// An application that passed every validation rule and had its quotes
/// doubled, ready for a single insert.
///
/// Only [`crate::validation::validate`] constructs these, so holding one is
/// proof the record satisfies the persisted-record invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    name: String,
    email: String,
    message: String,
}

impl NewApplication {
    pub(crate) fn new(name: String, email: String, message: String) -> Self {
        Self { name, email, message }
    }

    /// Applicant name, quote-doubled.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applicant email, quote-doubled.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Free-form message, quote-doubled.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A persisted application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Application {
    /// Identifier assigned at insert time.
    pub id: ApplicationId,
    /// Applicant name as stored.
    pub name: String,
    /// Applicant email as stored.
    pub email: String,
    /// Message as stored.
    pub message: String,
    /// Insert timestamp assigned by the store.
    pub created_at: DateTime<Utc>,
}

impl Application {
    /// Builds the stored form of `new` with store-assigned identity.
    pub fn from_new(new: NewApplication, id: ApplicationId, created_at: DateTime<Utc>) -> Self {
        Self { id, name: new.name, email: new.email, message: new.message, created_at }
    }
}
