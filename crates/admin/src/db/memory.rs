//! In-process administrator store.
//!
//! Mirrors the constraints of `admin.administrator` (one row, unique phone)
//! so the auth service and the session guard behave identically against it.
//! Used by the test suites and for running the panel without `PostgreSQL`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use monitor_panel_core::{AdminId, Phone};

use super::{AdministratorStore, PHONE_CONSTRAINT, RepositoryError, SINGLETON_CONSTRAINT};
use crate::models::{Administrator, NewAdministrator, PasswordHashes, StoredCredentials};

#[derive(Debug, Default)]
struct Inner {
    last_id: i32,
    record: Option<(Administrator, PasswordHashes)>,
}

/// Administrator store held in memory.
#[derive(Debug, Default)]
pub struct MemoryAdministratorStore {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
}

impl MemoryAdministratorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl AdministratorStore for MemoryAdministratorStore {
    async fn count(&self) -> Result<i64, RepositoryError> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        Ok(i64::from(inner.record.is_some()))
    }

    async fn get_by_id(&self, id: AdminId) -> Result<Option<Administrator>, RepositoryError> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .record
            .as_ref()
            .filter(|(admin, _)| admin.id == id)
            .map(|(admin, _)| admin.clone()))
    }

    async fn current(&self) -> Result<Option<Administrator>, RepositoryError> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        Ok(inner.record.as_ref().map(|(admin, _)| admin.clone()))
    }

    async fn find_by_phone(
        &self,
        phone: &Phone,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .record
            .as_ref()
            .filter(|(admin, _)| admin.phone == *phone)
            .map(|(admin, hashes)| StoredCredentials {
                administrator: admin.clone(),
                hashes: hashes.clone(),
            }))
    }

    async fn create(&self, admin: &NewAdministrator) -> Result<Administrator, RepositoryError> {
        self.check_available()?;
        let mut inner = self.inner.lock().await;

        if let Some((existing, _)) = &inner.record {
            let constraint = if existing.phone == admin.phone {
                PHONE_CONSTRAINT
            } else {
                SINGLETON_CONSTRAINT
            };
            return Err(RepositoryError::Conflict(constraint.to_owned()));
        }

        inner.last_id += 1;
        let created = Administrator {
            id: AdminId::new(inner.last_id),
            phone: admin.phone.clone(),
            email: admin.email.clone(),
            created_at: admin.created_at,
            last_login: None,
        };
        inner.record = Some((created.clone(), admin.hashes.clone()));

        Ok(created)
    }

    async fn record_login(&self, id: AdminId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        self.check_available()?;
        let mut inner = self.inner.lock().await;

        match inner.record.as_mut() {
            Some((admin, _)) if admin.id == id => {
                admin.last_login = Some(at);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: AdminId) -> Result<bool, RepositoryError> {
        self.check_available()?;
        let mut inner = self.inner.lock().await;

        let matches = inner
            .record
            .as_ref()
            .is_some_and(|(admin, _)| admin.id == id);
        if matches {
            inner.record = None;
        }

        Ok(matches)
    }
}
