//! Password hashing.
//!
//! Two independent hash families protect the administrator password:
//!
//! - family A: bcrypt, an adaptive salted hash ([`BcryptHasher`])
//! - family B: Argon2id, a memory-hard hash ([`Argon2Hasher`])
//!
//! [`DualHasher`] owns exactly one hasher per family. A password is accepted
//! only when both hashes verify.

use std::fmt;
use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::HashingConfig;
use crate::models::PasswordHashes;

/// Lowest bcrypt cost accepted by the bcrypt crate.
pub const BCRYPT_MIN_COST: u32 = 4;

/// Highest bcrypt cost accepted by the bcrypt crate.
pub const BCRYPT_MAX_COST: u32 = 31;

/// Hashing a password failed.
#[derive(Debug, Error)]
#[error("{algorithm} hashing failed: {message}")]
pub struct HashError {
    algorithm: &'static str,
    message: String,
}

impl HashError {
    pub(crate) fn new(algorithm: &'static str, message: impl Into<String>) -> Self {
        Self {
            algorithm,
            message: message.into(),
        }
    }
}

/// Invalid hashing parameters.
#[derive(Debug, Error)]
pub enum HashingConfigError {
    #[error("bcrypt cost must be between {BCRYPT_MIN_COST} and {BCRYPT_MAX_COST} (got {0})")]
    BcryptCost(u32),
    #[error("invalid argon2 parameters: {0}")]
    Argon2(argon2::Error),
}

/// One password-hashing algorithm.
///
/// Implementations are CPU-bound and synchronous; callers move them onto the
/// blocking thread pool.
pub trait PasswordHasher: Send + Sync + fmt::Debug {
    /// Short algorithm name for logs and errors.
    fn algorithm(&self) -> &'static str;

    /// Produce a self-describing encoded hash with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if the underlying library rejects the input.
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// Check `password` against an encoded hash.
    ///
    /// Malformed hashes and library errors report `false`.
    fn verify(&self, password: &str, encoded: &str) -> bool;
}

/// Hash family A: bcrypt.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Create a bcrypt hasher with the given cost (log2 rounds).
    ///
    /// # Errors
    ///
    /// Returns `HashingConfigError::BcryptCost` if the cost is out of range.
    pub const fn new(cost: u32) -> Result<Self, HashingConfigError> {
        if cost < BCRYPT_MIN_COST || cost > BCRYPT_MAX_COST {
            return Err(HashingConfigError::BcryptCost(cost));
        }
        Ok(Self { cost })
    }
}

impl PasswordHasher for BcryptHasher {
    fn algorithm(&self) -> &'static str {
        "bcrypt"
    }

    fn hash(&self, password: &str) -> Result<String, HashError> {
        bcrypt::hash(password, self.cost).map_err(|e| HashError::new(self.algorithm(), e.to_string()))
    }

    fn verify(&self, password: &str, encoded: &str) -> bool {
        bcrypt::verify(password, encoded).unwrap_or(false)
    }
}

/// Hash family B: Argon2id (v0x13).
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Create an Argon2id hasher.
    ///
    /// # Arguments
    ///
    /// * `memory_kib` - Memory cost in KiB
    /// * `iterations` - Time cost
    /// * `parallelism` - Degree of parallelism (lanes)
    ///
    /// # Errors
    ///
    /// Returns `HashingConfigError::Argon2` if argon2 rejects the parameters.
    pub fn new(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, HashingConfigError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(HashingConfigError::Argon2)?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn algorithm(&self) -> &'static str {
        "argon2id"
    }

    fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::new(self.algorithm(), e.to_string()))
    }

    fn verify(&self, password: &str, encoded: &str) -> bool {
        // Cost parameters are read from the encoded hash, so hashes made under
        // older settings keep verifying after a config change.
        let Ok(parsed) = PasswordHash::new(encoded) else {
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Password hashed once per process for [`DualHasher::verify_against_dummy`].
const DUMMY_PASSWORD: &str = "monitor-panel-dummy-password";

/// Exactly two hashers whose verdicts must agree.
#[derive(Debug, Clone)]
pub struct DualHasher {
    primary: Arc<dyn PasswordHasher>,
    secondary: Arc<dyn PasswordHasher>,
    dummy: Arc<OnceCell<PasswordHashes>>,
}

impl DualHasher {
    /// Pair two hashers. `primary` fills [`PasswordHashes::primary`].
    #[must_use]
    pub fn new(primary: Arc<dyn PasswordHasher>, secondary: Arc<dyn PasswordHasher>) -> Self {
        Self {
            primary,
            secondary,
            dummy: Arc::new(OnceCell::new()),
        }
    }

    /// Build the bcrypt + Argon2id pair from configuration.
    ///
    /// # Errors
    ///
    /// Returns `HashingConfigError` if either family's parameters are invalid.
    pub fn from_config(config: &HashingConfig) -> Result<Self, HashingConfigError> {
        let bcrypt = BcryptHasher::new(config.bcrypt_cost)?;
        let argon2 = Argon2Hasher::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )?;

        Ok(Self::new(Arc::new(bcrypt), Arc::new(argon2)))
    }

    /// Hash `password` with both families concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first `HashError` if either family fails.
    pub async fn hash(&self, password: &str) -> Result<PasswordHashes, HashError> {
        let (primary, secondary) = tokio::join!(
            hash_blocking(Arc::clone(&self.primary), password.to_owned()),
            hash_blocking(Arc::clone(&self.secondary), password.to_owned()),
        );

        Ok(PasswordHashes {
            primary: primary?,
            secondary: secondary?,
        })
    }

    /// Verify `password` against both stored hashes concurrently.
    ///
    /// Returns `true` only if both families accept the password.
    pub async fn verify(&self, password: &str, hashes: &PasswordHashes) -> bool {
        let (primary_ok, secondary_ok) = tokio::join!(
            verify_blocking(
                Arc::clone(&self.primary),
                password.to_owned(),
                hashes.primary.clone()
            ),
            verify_blocking(
                Arc::clone(&self.secondary),
                password.to_owned(),
                hashes.secondary.clone()
            ),
        );

        if primary_ok != secondary_ok {
            tracing::warn!(
                primary = self.primary.algorithm(),
                primary_ok,
                secondary = self.secondary.algorithm(),
                secondary_ok,
                "Password hash families disagree"
            );
        }

        primary_ok && secondary_ok
    }

    /// Run a full dual verification of `password` against fixed dummy hashes
    /// and discard the result.
    ///
    /// Login calls this for unknown phone numbers so that both failure cases
    /// cost the same hashing work. The dummy hashes are computed on first use
    /// with this hasher's parameters.
    pub async fn verify_against_dummy(&self, password: &str) {
        let dummy = self
            .dummy
            .get_or_try_init(|| self.hash(DUMMY_PASSWORD))
            .await;

        match dummy {
            Ok(hashes) => {
                self.verify(password, hashes).await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to prepare dummy password hashes"),
        }
    }
}

async fn hash_blocking(
    hasher: Arc<dyn PasswordHasher>,
    password: String,
) -> Result<String, HashError> {
    let algorithm = hasher.algorithm();

    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| HashError::new(algorithm, format!("hashing task failed: {e}")))?
}

async fn verify_blocking(
    hasher: Arc<dyn PasswordHasher>,
    password: String,
    encoded: String,
) -> bool {
    let algorithm = hasher.algorithm();

    match tokio::task::spawn_blocking(move || hasher.verify(&password, &encoded)).await {
        Ok(valid) => valid,
        Err(e) => {
            tracing::error!(algorithm, error = %e, "Password verification task failed");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cheap_argon2() -> Argon2Hasher {
        Argon2Hasher::new(Params::MIN_M_COST, 1, 1).unwrap()
    }

    fn cheap_dual() -> DualHasher {
        DualHasher::new(
            Arc::new(BcryptHasher::new(BCRYPT_MIN_COST).unwrap()),
            Arc::new(cheap_argon2()),
        )
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        assert!(BcryptHasher::new(3).is_err());
        assert!(BcryptHasher::new(32).is_err());
        assert!(BcryptHasher::new(10).is_ok());
    }

    #[test]
    fn test_argon2_rejects_zero_iterations() {
        assert!(matches!(
            Argon2Hasher::new(65536, 0, 4),
            Err(HashingConfigError::Argon2(_))
        ));
    }

    #[test]
    fn test_bcrypt_roundtrip() {
        let hasher = BcryptHasher::new(BCRYPT_MIN_COST).unwrap();
        let encoded = hasher.hash("correcthorse").unwrap();

        assert!(encoded.starts_with("$2"));
        assert!(hasher.verify("correcthorse", &encoded));
        assert!(!hasher.verify("correcthorsf", &encoded));
    }

    #[test]
    fn test_argon2_roundtrip_is_self_describing() {
        let hasher = cheap_argon2();
        let encoded = hasher.hash("correcthorse").unwrap();

        assert!(encoded.starts_with("$argon2id$v=19$"));
        assert!(hasher.verify("correcthorse", &encoded));
        assert!(!hasher.verify("correcthorsf", &encoded));
    }

    #[test]
    fn test_argon2_verifies_hash_made_with_other_params() {
        let strong = Argon2Hasher::new(Params::MIN_M_COST * 4, 2, 2).unwrap();
        let encoded = strong.hash("correcthorse").unwrap();

        assert!(cheap_argon2().verify("correcthorse", &encoded));
    }

    #[test]
    fn test_malformed_hashes_fail_verification() {
        assert!(!BcryptHasher::new(BCRYPT_MIN_COST)
            .unwrap()
            .verify("correcthorse", "not-a-hash"));
        assert!(!cheap_argon2().verify("correcthorse", "not-a-hash"));
        assert!(!cheap_argon2().verify("correcthorse", ""));
    }

    #[test]
    fn test_salts_differ_between_hashes() {
        let hasher = cheap_argon2();
        assert_ne!(
            hasher.hash("correcthorse").unwrap(),
            hasher.hash("correcthorse").unwrap()
        );
    }

    #[tokio::test]
    async fn test_dual_hash_then_verify() {
        let dual = cheap_dual();
        let hashes = dual.hash("correcthorse").await.unwrap();

        assert!(hashes.primary.starts_with("$2"));
        assert!(hashes.secondary.starts_with("$argon2id$"));
        assert!(dual.verify("correcthorse", &hashes).await);
        assert!(!dual.verify("correcthorsE", &hashes).await);
    }

    #[tokio::test]
    async fn test_dual_verify_requires_both_families() {
        let dual = cheap_dual();
        let good = dual.hash("correcthorse").await.unwrap();
        let other = dual.hash("batterystaple").await.unwrap();

        let bad_secondary = PasswordHashes {
            primary: good.primary.clone(),
            secondary: other.secondary.clone(),
        };
        let bad_primary = PasswordHashes {
            primary: other.primary,
            secondary: good.secondary,
        };

        assert!(!dual.verify("correcthorse", &bad_secondary).await);
        assert!(!dual.verify("correcthorse", &bad_primary).await);
    }

    #[tokio::test]
    async fn test_dummy_hashes_are_computed_once() {
        let dual = cheap_dual();
        assert!(dual.dummy.get().is_none());

        dual.verify_against_dummy("correcthorse").await;
        let first = dual.dummy.get().unwrap().clone();
        assert!(first.primary.starts_with("$2"));
        assert!(first.secondary.starts_with("$argon2id$"));

        // Clones share the cell.
        dual.clone().verify_against_dummy("batterystaple").await;
        assert_eq!(dual.dummy.get().unwrap(), &first);
    }

    #[tokio::test]
    async fn test_dual_verify_with_malformed_stored_hash() {
        let dual = cheap_dual();
        let good = dual.hash("correcthorse").await.unwrap();
        let corrupted = PasswordHashes {
            primary: good.primary,
            secondary: "$argon2id$garbage".to_owned(),
        };

        assert!(!dual.verify("correcthorse", &corrupted).await);
    }
}
