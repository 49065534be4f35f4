//! CLI subcommands.

pub mod admin;
pub mod migrate;

use monitor_panel_admin::config::{ConfigError, database_url_from_env};
use monitor_panel_admin::db;
use sqlx::PgPool;

/// Connect to the admin database named by `ADMIN_DATABASE_URL` / `DATABASE_URL`.
async fn connect() -> Result<PgPool, ConnectError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to admin database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Errors while opening the database connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}
