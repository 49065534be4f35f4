//! Administrator management commands.
//!
//! # Usage
//!
//! ```bash
//! # Show the administrator
//! mp-cli admin show
//!
//! # Create the administrator (password read from ADMIN_PASSWORD)
//! ADMIN_PASSWORD=... mp-cli admin create -p 5551234567 -e ops@example.com
//!
//! # Remove the administrator (re-opens registration)
//! mp-cli admin remove --yes
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_PASSWORD` - Password for `admin create`
//! - `BCRYPT_COST`, `ARGON2_*` - Hashing parameters, as for the server

use monitor_panel_admin::config::{ConfigError, HashingConfig};
use monitor_panel_admin::db::{AdministratorStore, PgAdministratorStore, RepositoryError};
use monitor_panel_admin::services::auth::{
    AdminAuthService, AuthError, DualHasher, HashingConfigError, Registration,
};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid hashing parameters: {0}")]
    Hashing(#[from] HashingConfigError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Registration rejected (validation, existing administrator, ...).
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// `remove` was called without `--yes`.
    #[error("Refusing to remove the administrator without --yes")]
    ConfirmationRequired,
}

/// Print the administrator record.
///
/// # Errors
///
/// Returns `AdminError` if the database cannot be queried.
pub async fn show() -> Result<(), AdminError> {
    let store = PgAdministratorStore::new(connect().await?);

    match store.current().await? {
        Some(admin) => {
            tracing::info!(
                "Administrator #{}: phone {}, email {}, created {}, last login {}",
                admin.id,
                admin.phone,
                admin.email.as_deref().unwrap_or("-"),
                admin.created_at,
                admin
                    .last_login
                    .map_or_else(|| "never".to_owned(), |at| at.to_string()),
            );
        }
        None => tracing::info!("No administrator registered; registration is open"),
    }

    Ok(())
}

/// Create the administrator through the same checks as the web form.
///
/// # Arguments
///
/// * `phone` - Login phone number
/// * `email` - Optional contact email
///
/// # Returns
///
/// The ID of the created administrator.
///
/// # Errors
///
/// Returns `AdminError::Auth` if registration is closed or the input is invalid.
pub async fn create(phone: &str, email: Option<&str>) -> Result<i32, AdminError> {
    let password =
        std::env::var("ADMIN_PASSWORD").map_err(|_| AdminError::MissingEnvVar("ADMIN_PASSWORD"))?;

    let hasher = DualHasher::from_config(&HashingConfig::from_env()?)?;
    let store = PgAdministratorStore::new(connect().await?);

    tracing::info!("Creating administrator: {}", phone.trim());

    let admin = AdminAuthService::new(&store, &hasher)
        .register(&Registration {
            phone,
            password: &password,
            confirm_password: &password,
            email,
        })
        .await?;

    tracing::info!(
        "Administrator created successfully! ID: {}, Phone: {}",
        admin.id,
        admin.phone
    );

    Ok(admin.id.as_i32())
}

/// Delete the administrator.
///
/// Existing sessions become stale and are revoked on their next request.
///
/// # Errors
///
/// Returns `AdminError::ConfirmationRequired` unless `confirmed` is set.
pub async fn remove(confirmed: bool) -> Result<(), AdminError> {
    if !confirmed {
        return Err(AdminError::ConfirmationRequired);
    }

    let store = PgAdministratorStore::new(connect().await?);

    let Some(admin) = store.current().await? else {
        tracing::info!("No administrator registered; nothing to remove");
        return Ok(());
    };

    if store.delete(admin.id).await? {
        tracing::warn!(
            "Administrator #{} ({}) removed; registration is open again",
            admin.id,
            admin.phone
        );
    }

    Ok(())
}
