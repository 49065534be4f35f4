//! Database operations for the admin panel.
//!
//! # Tables (schema `admin`)
//!
//! - `administrator` - The single administrator record (dual password hashes)
//! - `session` - tower-sessions storage, created by `mp-cli migrate`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p monitor-panel-cli -- migrate
//! ```
//!
//! Handlers never talk to `sqlx` directly; they go through the
//! [`AdministratorStore`] trait so the guard and the auth service can be
//! exercised against [`MemoryAdministratorStore`] in tests.

pub mod administrators;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use monitor_panel_core::{AdminId, Phone};

use crate::models::{Administrator, NewAdministrator, StoredCredentials};

pub use administrators::PgAdministratorStore;
pub use memory::MemoryAdministratorStore;

/// Unique constraint that allows at most one administrator row.
pub const SINGLETON_CONSTRAINT: &str = "administrator_singleton_key";

/// Unique constraint on the administrator phone number.
pub const PHONE_CONSTRAINT: &str = "administrator_phone_key";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation; carries the constraint name.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Persistent storage for the administrator record.
///
/// Every method is a single atomic store operation. Implementations must
/// enforce the one-administrator rule inside [`create`](Self::create) itself
/// (reporting [`SINGLETON_CONSTRAINT`]), not rely on callers checking
/// [`count`](Self::count) first.
#[async_trait]
pub trait AdministratorStore: Send + Sync {
    /// Number of administrator records (0 or 1).
    async fn count(&self) -> Result<i64, RepositoryError>;

    /// Point lookup by id.
    async fn get_by_id(&self, id: AdminId) -> Result<Option<Administrator>, RepositoryError>;

    /// The administrator, if one has registered.
    async fn current(&self) -> Result<Option<Administrator>, RepositoryError>;

    /// Exact-match lookup by phone, returning the stored password hashes.
    async fn find_by_phone(
        &self,
        phone: &Phone,
    ) -> Result<Option<StoredCredentials>, RepositoryError>;

    /// Insert the administrator record.
    ///
    /// Fails with [`RepositoryError::Conflict`] naming [`SINGLETON_CONSTRAINT`]
    /// if a record already exists, or [`PHONE_CONSTRAINT`] if the phone is taken.
    async fn create(&self, admin: &NewAdministrator) -> Result<Administrator, RepositoryError>;

    /// Set `last_login`. Fails with [`RepositoryError::NotFound`] if the record is gone.
    async fn record_login(&self, id: AdminId, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// Delete the record. Returns `false` if it did not exist.
    async fn delete(&self, id: AdminId) -> Result<bool, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
