//! Administrator domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use monitor_panel_core::{AdminId, Phone};

/// The single administrator permitted to use the panel (domain type).
///
/// Password hashes are deliberately not part of this type; they only leave
/// the store through [`StoredCredentials`] during login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Administrator {
    /// Store-assigned id.
    pub id: AdminId,
    /// Login key, unique and trimmed.
    pub phone: Phone,
    /// Optional contact address.
    pub email: Option<String>,
    /// When the administrator registered.
    pub created_at: DateTime<Utc>,
    /// Last successful authentication, if any.
    pub last_login: Option<DateTime<Utc>>,
}

/// Both encoded password hashes of an administrator.
///
/// Each string is self-describing (algorithm, cost parameters, salt, digest).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHashes {
    /// Hash family A output (bcrypt, `$2b$...`), column `password_bcrypt`.
    pub primary: String,
    /// Hash family B output (Argon2id, `$argon2id$...`), column `password_argon2`.
    pub secondary: String,
}

impl std::fmt::Debug for PasswordHashes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHashes")
            .field("primary", &"[REDACTED]")
            .field("secondary", &"[REDACTED]")
            .finish()
    }
}

/// An administrator together with the hashes needed to verify a login.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub administrator: Administrator,
    pub hashes: PasswordHashes,
}

/// Data required to insert the administrator record.
#[derive(Debug, Clone)]
pub struct NewAdministrator {
    pub phone: Phone,
    pub email: Option<String>,
    pub hashes: PasswordHashes,
    pub created_at: DateTime<Utc>,
}
