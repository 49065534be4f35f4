//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::db::AdministratorStore;
use crate::services::auth::{AdminAuthService, DualHasher, HashingConfigError};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Arc<dyn AdministratorStore>,
    hasher: DualHasher,
}

impl AppState {
    /// Build state from configuration and an administrator store.
    ///
    /// # Errors
    ///
    /// Returns `HashingConfigError` if the configured hashing parameters are
    /// rejected by bcrypt or argon2.
    pub fn new(
        config: AdminConfig,
        store: Arc<dyn AdministratorStore>,
    ) -> Result<Self, HashingConfigError> {
        let hasher = DualHasher::from_config(&config.hashing)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                hasher,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn AdministratorStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn hasher(&self) -> &DualHasher {
        &self.inner.hasher
    }

    /// Authentication service borrowing this state's store and hasher.
    #[must_use]
    pub fn auth(&self) -> AdminAuthService<'_> {
        AdminAuthService::new(self.store(), self.hasher())
    }
}
