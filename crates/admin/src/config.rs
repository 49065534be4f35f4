//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the admin panel (https enables secure cookies)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3000)
//! - `ADMIN_SESSION_TTL_HOURS` - Fixed session lifetime after login (default: 24)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - 0.0 to 1.0 (default: 1.0)
//!
//! ## Optional (password hashing)
//! - `BCRYPT_COST` - bcrypt cost, 4 to 31 (default: 10)
//! - `ARGON2_MEMORY_KIB` - Argon2id memory cost (default: 65536)
//! - `ARGON2_ITERATIONS` - Argon2id time cost (default: 3)
//! - `ARGON2_PARALLELISM` - Argon2id lanes (default: 4)
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_SESSION_TTL_HOURS: u32 = 24;

/// Longest accepted session lifetime (one year).
pub const MAX_SESSION_TTL_HOURS: u32 = 8760;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Session lifetime in hours, counted from login
    pub session_ttl_hours: u32,
    /// Password hashing cost parameters
    pub hashing: HashingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Cost parameters for the two password hash families.
///
/// Changing these only affects newly created hashes; stored hashes carry
/// their own parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    /// bcrypt cost (log2 rounds)
    pub bcrypt_cost: u32,
    /// Argon2id memory cost in KiB
    pub argon2_memory_kib: u32,
    /// Argon2id time cost
    pub argon2_iterations: u32,
    /// Argon2id parallelism
    pub argon2_parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: 10,
            argon2_memory_kib: 65536,
            argon2_iterations: 3,
            argon2_parallelism: 4,
        }
    }
}

impl HashingConfig {
    /// Load hashing parameters from `BCRYPT_COST` and `ARGON2_*`, defaulting
    /// each unset variable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            bcrypt_cost: get_parsed_or_default("BCRYPT_COST", defaults.bcrypt_cost)?,
            argon2_memory_kib: get_parsed_or_default(
                "ARGON2_MEMORY_KIB",
                defaults.argon2_memory_kib,
            )?,
            argon2_iterations: get_parsed_or_default(
                "ARGON2_ITERATIONS",
                defaults.argon2_iterations,
            )?,
            argon2_parallelism: get_parsed_or_default(
                "ARGON2_PARALLELISM",
                defaults.argon2_parallelism,
            )?,
        })
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host: IpAddr = get_parsed_or_default("ADMIN_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port: u16 = get_parsed_or_default("ADMIN_PORT", 3000)?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;
        let session_ttl_hours = check_session_ttl(get_parsed_or_default(
            "ADMIN_SESSION_TTL_HOURS",
            DEFAULT_SESSION_TTL_HOURS,
        )?)?;

        let hashing = HashingConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_ttl_hours,
            hashing,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Session lifetime as a cookie duration, capped at [`MAX_SESSION_TTL_HOURS`].
    #[must_use]
    pub fn session_ttl(&self) -> tower_sessions::cookie::time::Duration {
        let hours = self.session_ttl_hours.min(MAX_SESSION_TTL_HOURS);
        tower_sessions::cookie::time::Duration::hours(i64::from(hours))
    }
}

/// Load only the database URL (`ADMIN_DATABASE_URL`, falling back to `DATABASE_URL`).
///
/// For tools that talk to the database without serving HTTP.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("ADMIN_DATABASE_URL")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse an optional environment variable, using `default` when unset.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

/// `now + ttl` must stay representable as a cookie expiry.
fn check_session_ttl(hours: u32) -> Result<u32, ConfigError> {
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        return Err(ConfigError::InvalidEnvVar(
            "ADMIN_SESSION_TTL_HOURS".to_string(),
            format!("must be between 1 and {MAX_SESSION_TTL_HOURS} (got {hours})"),
        ));
    }
    Ok(hours)
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
