//! Admin authentication service.
//!
//! Password authentication for the single administrator. Every password is
//! stored under two independent hash families (see [`hasher`]) and a login
//! succeeds only when both verify.
//!
//! Registration is open exactly until the first administrator exists.

mod error;
pub mod hasher;

pub use error::AuthError;
pub use hasher::{
    Argon2Hasher, BcryptHasher, DualHasher, HashError, HashingConfigError, PasswordHasher,
};

use chrono::Utc;

use monitor_panel_core::{Phone, PhoneError};

use crate::db::{AdministratorStore, PHONE_CONSTRAINT, RepositoryError, SINGLETON_CONSTRAINT};
use crate::models::{Administrator, NewAdministrator};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration form input, as submitted.
#[derive(Clone, Copy)]
pub struct Registration<'r> {
    pub phone: &'r str,
    pub password: &'r str,
    pub confirm_password: &'r str,
    pub email: Option<&'r str>,
}

impl std::fmt::Debug for Registration<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

/// Admin authentication service.
///
/// Borrows the store and hasher from application state for the duration of
/// one request.
pub struct AdminAuthService<'a> {
    store: &'a dyn AdministratorStore,
    hasher: &'a DualHasher,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn AdministratorStore, hasher: &'a DualHasher) -> Self {
        Self { store, hasher }
    }

    /// Whether no administrator exists yet.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store cannot be queried.
    pub async fn registration_open(&self) -> Result<bool, AuthError> {
        Ok(self.store.count().await? == 0)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Create the administrator.
    ///
    /// Checks run in a fixed order: an existing administrator always wins
    /// over input validation errors.
    ///
    /// # Errors
    ///
    /// - `RegistrationDisabled` if an administrator already exists
    /// - `MissingFields` if phone or password is empty
    /// - `PasswordTooShort` if the password has fewer than
    ///   [`MIN_PASSWORD_LENGTH`] characters
    /// - `PasswordMismatch` if the confirmation differs
    /// - `InvalidPhone` if the phone number is too long
    /// - `PhoneTaken` if the phone number is already registered
    /// - `PasswordHash` / `Repository` on infrastructure failure
    pub async fn register(&self, input: &Registration<'_>) -> Result<Administrator, AuthError> {
        if !self.registration_open().await? {
            return Err(AuthError::RegistrationDisabled);
        }

        let phone = match Phone::parse(input.phone) {
            Err(PhoneError::Empty) => return Err(AuthError::MissingFields),
            other => other,
        };
        if input.password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }

        if input.password != input.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let phone = phone.map_err(AuthError::InvalidPhone)?;

        if self.store.find_by_phone(&phone).await?.is_some() {
            return Err(AuthError::PhoneTaken);
        }

        let hashes = self
            .hasher
            .hash(input.password)
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        let email = input
            .email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_owned);

        let admin = self
            .store
            .create(&NewAdministrator {
                phone,
                email,
                hashes,
                created_at: Utc::now(),
            })
            .await
            .map_err(map_create_conflict)?;

        tracing::info!(admin_id = %admin.id, phone = %admin.phone, "Administrator registered");

        Ok(admin)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Verify a phone/password pair and record the login.
    ///
    /// Unknown phone and wrong password produce the same error.
    ///
    /// # Errors
    ///
    /// - `MissingFields` if phone or password is empty
    /// - `InvalidCredentials` if the phone is unknown or either hash rejects
    ///   the password
    /// - `Repository` on store failure
    pub async fn authenticate(
        &self,
        phone: &str,
        password: &str,
    ) -> Result<Administrator, AuthError> {
        if phone.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let Ok(phone) = Phone::parse(phone) else {
            return Err(AuthError::InvalidCredentials);
        };

        let Some(credentials) = self.store.find_by_phone(&phone).await? else {
            self.hasher.verify_against_dummy(password).await;
            tracing::warn!(phone = %phone, "Login attempt for unknown phone");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &credentials.hashes).await {
            tracing::warn!(phone = %phone, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let mut admin = credentials.administrator;
        let now = Utc::now();

        match self.store.record_login(admin.id, now).await {
            Ok(()) => {}
            // Deleted between lookup and update.
            Err(RepositoryError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        }
        admin.last_login = Some(now);

        tracing::info!(admin_id = %admin.id, "Administrator logged in");

        Ok(admin)
    }
}

fn map_create_conflict(err: RepositoryError) -> AuthError {
    match err {
        RepositoryError::Conflict(constraint) if constraint == SINGLETON_CONSTRAINT => {
            AuthError::RegistrationDisabled
        }
        RepositoryError::Conflict(constraint) if constraint == PHONE_CONSTRAINT => {
            AuthError::PhoneTaken
        }
        other => AuthError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Barrier;

    use super::*;
    use crate::db::MemoryAdministratorStore;

    const PHONE: &str = "5551234567";
    const PASSWORD: &str = "correcthorse";

    fn cheap_hasher() -> DualHasher {
        DualHasher::new(
            Arc::new(BcryptHasher::new(hasher::BCRYPT_MIN_COST).unwrap()),
            Arc::new(Argon2Hasher::new(argon2::Params::MIN_M_COST, 1, 1).unwrap()),
        )
    }

    #[derive(Debug)]
    struct BrokenHasher;

    impl PasswordHasher for BrokenHasher {
        fn algorithm(&self) -> &'static str {
            "broken"
        }

        fn hash(&self, _password: &str) -> Result<String, HashError> {
            Err(HashError::new(self.algorithm(), "unavailable"))
        }

        fn verify(&self, _password: &str, _encoded: &str) -> bool {
            false
        }
    }

    /// Accepts any password and counts calls per operation.
    #[derive(Debug, Default)]
    struct CountingHasher {
        hashes: AtomicUsize,
        verifications: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn algorithm(&self) -> &'static str {
            "counting"
        }

        fn hash(&self, password: &str) -> Result<String, HashError> {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            Ok(format!("counted:{}", password.len()))
        }

        fn verify(&self, _password: &str, _encoded: &str) -> bool {
            self.verifications.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    /// Holds every `create` until two callers have reached it.
    struct RendezvousStore {
        inner: MemoryAdministratorStore,
        barrier: Barrier,
    }

    #[async_trait]
    impl AdministratorStore for RendezvousStore {
        async fn count(&self) -> Result<i64, RepositoryError> {
            self.inner.count().await
        }

        async fn get_by_id(
            &self,
            id: monitor_panel_core::AdminId,
        ) -> Result<Option<Administrator>, RepositoryError> {
            self.inner.get_by_id(id).await
        }

        async fn current(&self) -> Result<Option<Administrator>, RepositoryError> {
            self.inner.current().await
        }

        async fn find_by_phone(
            &self,
            phone: &Phone,
        ) -> Result<Option<crate::models::StoredCredentials>, RepositoryError> {
            self.inner.find_by_phone(phone).await
        }

        async fn create(&self, admin: &NewAdministrator) -> Result<Administrator, RepositoryError> {
            self.barrier.wait().await;
            self.inner.create(admin).await
        }

        async fn record_login(
            &self,
            id: monitor_panel_core::AdminId,
            at: chrono::DateTime<Utc>,
        ) -> Result<(), RepositoryError> {
            self.inner.record_login(id, at).await
        }

        async fn delete(&self, id: monitor_panel_core::AdminId) -> Result<bool, RepositoryError> {
            self.inner.delete(id).await
        }
    }

    fn registration<'r>(phone: &'r str, password: &'r str, confirm: &'r str) -> Registration<'r> {
        Registration {
            phone,
            password,
            confirm_password: confirm,
            email: None,
        }
    }

    async fn registered(store: &MemoryAdministratorStore, hasher: &DualHasher) -> Administrator {
        AdminAuthService::new(store, hasher)
            .register(&registration(PHONE, PASSWORD, PASSWORD))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_first_administrator() {
        let store = MemoryAdministratorStore::new();
        let hasher = cheap_hasher();
        let service = AdminAuthService::new(&store, &hasher);

        assert!(service.registration_open().await.unwrap());

        let admin = service
            .register(&Registration {
                email: Some("  ops@example.com "),
                ..registration(" 5551234567 ", PASSWORD, PASSWORD)
            })
            .await
            .unwrap();

        assert_eq!(admin.phone.as_str(), PHONE);
        assert_eq!(admin.email.as_deref(), Some("ops@example.com"));
        assert!(admin.last_login.is_none());
        assert!(!service.registration_open().await.unwrap());

        let stored = store
            .find_by_phone(&admin.phone)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.hashes.primary.starts_with("$2"));
        assert!(stored.hashes.secondary.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_blank_email_is_stored_as_none() {
        let store = MemoryAdministratorStore::new();
        let hasher = cheap_hasher();
        let admin = AdminAuthService::new(&store, &hasher)
            .register(&Registration {
                email: Some("   "),
                ..registration(PHONE, PASSWORD, PASSWORD)
            })
            .await
            .unwrap();

        assert!(admin.email.is_none());
    }

    #[tokio::test]
    async fn test_second_registration_is_disabled_regardless_of_input() {
        let store = MemoryAdministratorStore::new();
        let hasher = cheap_hasher();
        registered(&store, &hasher).await;
        let service = AdminAuthService::new(&store, &hasher);

        for input in [
            registration("5559999999", "anotherpass", "anotherpass"),
            registration("", "", ""),
            registration("5559999999", "short", "short"),
            registration(PHONE, PASSWORD, "different"),
        ] {
            let err = service.register(&input).await.unwrap_err();
            assert!(matches!(err, AuthError::RegistrationDisabled), "{err:?}");
        }

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_validation_order() {
        let store = MemoryAdministratorStore::new();
        let hasher = cheap_hasher();
        let service = AdminAuthService::new(&store, &hasher);

        let cases = [
            (registration("", PASSWORD, PASSWORD), "missing phone"),
            (registration("   ", PASSWORD, PASSWORD), "blank phone"),
            (registration(PHONE, "", ""), "missing password"),
        ];
        for (input, label) in cases {
            let err = service.register(&input).await.unwrap_err();
            assert!(matches!(err, AuthError::MissingFields), "{label}: {err:?}");
        }

        // Too short wins over mismatch.
        let err = service
            .register(&registration(PHONE, "short", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordTooShort { min: 8 }));

        let err = service
            .register(&registration(PHONE, PASSWORD, "correcthorsf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));

        let long_phone = "5".repeat(Phone::MAX_LENGTH + 1);
        let err = service
            .register(&registration(&long_phone, PASSWORD, PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidPhone(_)));

        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_password_length_counts_characters() {
        let store = MemoryAdministratorStore::new();
        let hasher = cheap_hasher();
        let service = AdminAuthService::new(&store, &hasher);

        // 7 characters, 14 bytes.
        let err = service
            .register(&registration(PHONE, "ééééééé", "ééééééé"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordTooShort { .. }));

        service
            .register(&registration(PHONE, "éééééééé", "éééééééé"))
            .await
            .unwrap();
    }

    #[test]
    fn test_insert_conflicts_map_by_constraint() {
        assert!(matches!(
            map_create_conflict(RepositoryError::Conflict(SINGLETON_CONSTRAINT.to_owned())),
            AuthError::RegistrationDisabled
        ));
        assert!(matches!(
            map_create_conflict(RepositoryError::Conflict(PHONE_CONSTRAINT.to_owned())),
            AuthError::PhoneTaken
        ));
        assert!(matches!(
            map_create_conflict(RepositoryError::Conflict("other_key".to_owned())),
            AuthError::Repository(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_hashing_failure_creates_nothing() {
        let store = MemoryAdministratorStore::new();
        let hasher = DualHasher::new(
            Arc::new(BcryptHasher::new(hasher::BCRYPT_MIN_COST).unwrap()),
            Arc::new(BrokenHasher),
        );

        let err = AdminAuthService::new(&store, &hasher)
            .register(&registration(PHONE, PASSWORD, PASSWORD))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::PasswordHash(_)));
        assert!(err.user_message().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_authenticate_success_records_login() {
        let store = MemoryAdministratorStore::new();
        let hasher = cheap_hasher();
        let created = registered(&store, &hasher).await;

        let admin = AdminAuthService::new(&store, &hasher)
            .authenticate(" 5551234567 ", PASSWORD)
            .await
            .unwrap();

        assert_eq!(admin.id, created.id);
        assert!(admin.last_login.is_some());
        assert_eq!(
            store.get_by_id(admin.id).await.unwrap().unwrap().last_login,
            admin.last_login
        );
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let store = MemoryAdministratorStore::new();
        let hasher = cheap_hasher();
        registered(&store, &hasher).await;
        let service = AdminAuthService::new(&store, &hasher);

        let wrong_password = service
            .authenticate(PHONE, "correcthorsf")
            .await
            .unwrap_err();
        let unknown_phone = service
            .authenticate("5550000000", PASSWORD)
            .await
            .unwrap_err();
        let formatted_phone = service
            .authenticate("555-123-4567", PASSWORD)
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_phone, AuthError::InvalidCredentials));
        assert!(matches!(formatted_phone, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_phone.to_string());
    }

    #[tokio::test]
    async fn test_unknown_phone_still_runs_both_verifications() {
        let store = MemoryAdministratorStore::new();
        let primary = Arc::new(CountingHasher::default());
        let secondary = Arc::new(CountingHasher::default());
        let hasher = DualHasher::new(primary.clone(), secondary.clone());
        let service = AdminAuthService::new(&store, &hasher);

        for _ in 0..2 {
            let err = service
                .authenticate("5550000000", PASSWORD)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }

        for family in [&primary, &secondary] {
            assert_eq!(family.verifications.load(Ordering::SeqCst), 2);
            // Dummy hashes are prepared once.
            assert_eq!(family.hashes.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_concurrent_registrations_past_the_count_check() {
        let store = RendezvousStore {
            inner: MemoryAdministratorStore::new(),
            barrier: Barrier::new(2),
        };
        let hasher = cheap_hasher();
        let service = AdminAuthService::new(&store, &hasher);

        // Both calls pass every pre-check before either insert runs.
        let reg_a = registration(PHONE, PASSWORD, PASSWORD);
        let reg_b = registration("5559999999", "batterystaple", "batterystaple");
        let (first, second) = tokio::join!(service.register(&reg_a), service.register(&reg_b));

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(AuthError::RegistrationDisabled)))
        );
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_registrations_create_one_administrator() {
        let store = Arc::new(MemoryAdministratorStore::new());
        let hasher = Arc::new(cheap_hasher());

        let tasks: Vec<_> = ["5551234567", "5559999999", "5550000001", "5550000002"]
            .into_iter()
            .map(|phone| {
                let store = Arc::clone(&store);
                let hasher = Arc::clone(&hasher);
                tokio::spawn(async move {
                    AdminAuthService::new(store.as_ref(), &hasher)
                        .register(&registration(phone, PASSWORD, PASSWORD))
                        .await
                })
            })
            .collect();

        let mut winners = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => winners += 1,
                Err(AuthError::RegistrationDisabled) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_missing_fields() {
        let store = MemoryAdministratorStore::new();
        let hasher = cheap_hasher();
        let service = AdminAuthService::new(&store, &hasher);

        for (phone, password) in [("", PASSWORD), ("  ", PASSWORD), (PHONE, "")] {
            let err = service.authenticate(phone, password).await.unwrap_err();
            assert!(matches!(err, AuthError::MissingFields));
        }
    }

    #[tokio::test]
    async fn test_authenticate_requires_both_hashes() {
        let store = MemoryAdministratorStore::new();
        let strict = cheap_hasher();
        registered(&store, &strict).await;

        // Same bcrypt family, but a secondary that never verifies.
        let half_broken = DualHasher::new(
            Arc::new(BcryptHasher::new(hasher::BCRYPT_MIN_COST).unwrap()),
            Arc::new(BrokenHasher),
        );

        let err = AdminAuthService::new(&store, &half_broken)
            .authenticate(PHONE, PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_repository_error() {
        let store = MemoryAdministratorStore::new();
        let hasher = cheap_hasher();
        registered(&store, &hasher).await;
        store.set_unavailable(true);
        let service = AdminAuthService::new(&store, &hasher);

        let err = service.authenticate(PHONE, PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthError::Repository(_)));

        let err = service
            .register(&registration(PHONE, PASSWORD, PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Repository(_)));
    }

    #[test]
    fn test_registration_debug_redacts_passwords() {
        let debug_output = format!("{:?}", registration(PHONE, PASSWORD, PASSWORD));
        assert!(debug_output.contains(PHONE));
        assert!(!debug_output.contains(PASSWORD));
    }
}
