//! Domain models for admin.

pub mod administrator;
pub mod session;

pub use administrator::{Administrator, NewAdministrator, PasswordHashes, StoredCredentials};
pub use session::{CurrentAdmin, keys as session_keys};
