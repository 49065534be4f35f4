//! `PostgreSQL` administrator store.
//!
//! Queries are checked at runtime (`query_as` with `FromRow` rows) so the
//! crate builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use monitor_panel_core::{AdminId, Phone};

use super::{AdministratorStore, RepositoryError};
use crate::models::{Administrator, NewAdministrator, PasswordHashes, StoredCredentials};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for administrator queries.
#[derive(Debug, sqlx::FromRow)]
struct AdministratorRow {
    id: i32,
    phone: String,
    email: Option<String>,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<AdministratorRow> for Administrator {
    type Error = RepositoryError;

    fn try_from(row: AdministratorRow) -> Result<Self, Self::Error> {
        let phone = Phone::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;

        Ok(Self {
            id: AdminId::new(row.id),
            phone,
            email: row.email,
            created_at: row.created_at,
            last_login: row.last_login,
        })
    }
}

/// Internal row type for login lookups (includes both hashes).
#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    id: i32,
    phone: String,
    email: Option<String>,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
    password_bcrypt: String,
    password_argon2: String,
}

impl TryFrom<CredentialsRow> for StoredCredentials {
    type Error = RepositoryError;

    fn try_from(row: CredentialsRow) -> Result<Self, Self::Error> {
        let administrator = Administrator::try_from(AdministratorRow {
            id: row.id,
            phone: row.phone,
            email: row.email,
            created_at: row.created_at,
            last_login: row.last_login,
        })?;

        Ok(Self {
            administrator,
            hashes: PasswordHashes {
                primary: row.password_bcrypt,
                secondary: row.password_argon2,
            },
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// Administrator store backed by `admin.administrator`.
#[derive(Debug, Clone)]
pub struct PgAdministratorStore {
    pool: PgPool,
}

impl PgAdministratorStore {
    /// Create a new store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdministratorStore for PgAdministratorStore {
    async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin.administrator")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn get_by_id(&self, id: AdminId) -> Result<Option<Administrator>, RepositoryError> {
        let row = sqlx::query_as::<_, AdministratorRow>(
            r"
            SELECT id, phone, email, created_at, last_login
            FROM admin.administrator
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn current(&self) -> Result<Option<Administrator>, RepositoryError> {
        let row = sqlx::query_as::<_, AdministratorRow>(
            r"
            SELECT id, phone, email, created_at, last_login
            FROM admin.administrator
            ORDER BY id
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_phone(
        &self,
        phone: &Phone,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r"
            SELECT id, phone, email, created_at, last_login,
                   password_bcrypt, password_argon2
            FROM admin.administrator
            WHERE phone = $1
            ",
        )
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(&self, admin: &NewAdministrator) -> Result<Administrator, RepositoryError> {
        let row = sqlx::query_as::<_, AdministratorRow>(
            r"
            INSERT INTO admin.administrator
                (phone, password_bcrypt, password_argon2, email, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, phone, email, created_at, last_login
            ",
        )
        .bind(admin.phone.as_str())
        .bind(&admin.hashes.primary)
        .bind(&admin.hashes.secondary)
        .bind(admin.email.as_deref())
        .bind(admin.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        row.try_into()
    }

    async fn record_login(&self, id: AdminId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE admin.administrator SET last_login = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: AdminId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.administrator WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Turn unique violations into [`RepositoryError::Conflict`] carrying the constraint name.
fn map_insert_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(db_err.constraint().unwrap_or_default().to_owned());
    }

    RepositoryError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(phone: &str) -> AdministratorRow {
        AdministratorRow {
            id: 1,
            phone: phone.to_owned(),
            email: None,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_row_conversion() {
        let admin = Administrator::try_from(row("5551234567")).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(admin.id, AdminId::new(1));
        assert_eq!(admin.phone.as_str(), "5551234567");
    }

    #[test]
    fn test_row_with_blank_phone_is_corruption() {
        let result = Administrator::try_from(row("   "));
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = map_insert_error(sqlx::Error::RowNotFound);
        assert!(matches!(
            err,
            RepositoryError::Database(sqlx::Error::RowNotFound)
        ));
    }
}
