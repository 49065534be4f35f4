//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use monitor_panel_core::{AdminId, Phone};

use super::administrator::Administrator;

/// Session-stored admin identity.
///
/// A copy taken at login time. Later changes to the administrator record are
/// not reflected here until the next login; only the id is re-checked against
/// the store on each guarded request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Administrator's database ID.
    pub id: AdminId,
    /// Phone number used to log in.
    pub phone: Phone,
    /// Contact email, if one was given at registration.
    pub email: Option<String>,
}

impl From<&Administrator> for CurrentAdmin {
    fn from(admin: &Administrator) -> Self {
        Self {
            id: admin.id,
            phone: admin.phone.clone(),
            email: admin.email.clone(),
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
