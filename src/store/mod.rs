//! # Store Module
//!
//! The keyed identity store the auth core reads from and writes to. Callers
//! only see the [`IdentityStore`] trait; `sqlite` provides the implementation
//! used by the service.

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

use crate::auth::models::Identity;

pub use sqlite::SqliteIdentityStore;

/// Fields an identity can be addressed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    IdentityId,
    Email,
    Phone,
}

impl IdentityField {
    pub fn column(&self) -> &'static str {
        match self {
            IdentityField::IdentityId => "user_id",
            IdentityField::Email => "email",
            IdentityField::Phone => "phone",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Token fields written on every successful login
#[derive(Debug, Clone)]
pub struct TokenUpdate {
    pub token: String,
    pub refresh_token: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("identity not found")]
    NotFound,

    #[error("{0} already in use")]
    Duplicate(IdentityField),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Keyed access to identity records.
///
/// Counts and reads only see records created by `insert`. Bare rows left by
/// `upsert_by_field` are invisible to both.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn count_by_field(&self, field: IdentityField, value: &str) -> Result<i64, StoreError>;

    async fn find_one_by_field(
        &self,
        field: IdentityField,
        value: &str,
    ) -> Result<Identity, StoreError>;

    /// Overwrites the token fields of the matching record, creating a bare
    /// record keyed by `field = value` when none exists.
    async fn upsert_by_field(
        &self,
        field: IdentityField,
        value: &str,
        update: &TokenUpdate,
    ) -> Result<(), StoreError>;

    async fn insert(&self, identity: &Identity) -> Result<String, StoreError>;

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Identity>, StoreError>;
}
