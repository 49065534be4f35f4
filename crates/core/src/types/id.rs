//! Administrator identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned identifier of the administrator record.
///
/// The value is opaque to callers: it is only ever compared, displayed, and
/// handed back to the store for point lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct AdminId(i32);

impl AdminId {
    /// Create an id from the raw store value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the underlying i32 value.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AdminId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for AdminId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<AdminId> for i32 {
    fn from(id: AdminId) -> Self {
        id.0
    }
}
