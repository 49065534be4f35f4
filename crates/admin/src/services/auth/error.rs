//! Admin authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use monitor_panel_core::PhoneError;

use crate::db::RepositoryError;

/// Errors that can occur during registration, login and session checks.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Phone number or password was empty.
    #[error("Phone number and password are required")]
    MissingFields,

    /// Password is shorter than the minimum length.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Phone number is not acceptable (e.g. too long).
    #[error("Invalid phone number: {0}")]
    InvalidPhone(PhoneError),

    /// Another record already uses this phone number.
    #[error("Phone number already registered")]
    PhoneTaken,

    /// An administrator already exists.
    #[error("Admin registration is disabled. An administrator already exists.")]
    RegistrationDisabled,

    /// Unknown phone or wrong password (deliberately indistinguishable).
    #[error("Invalid phone number or password")]
    InvalidCredentials,

    /// No authenticated session.
    #[error("authentication required")]
    Unauthenticated,

    /// The session refers to an administrator that no longer exists.
    #[error("session refers to a deleted administrator")]
    StaleSession,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// A hashing library failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// Session store error.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AuthError {
    /// Message safe to show on the login/register forms.
    ///
    /// Returns `None` for infrastructure failures; callers show a generic
    /// "please try again" message instead.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::MissingFields
            | Self::PasswordTooShort { .. }
            | Self::PasswordMismatch
            | Self::InvalidPhone(_)
            | Self::PhoneTaken
            | Self::RegistrationDisabled
            | Self::InvalidCredentials => Some(self.to_string()),
            Self::Unauthenticated
            | Self::StaleSession
            | Self::Repository(_)
            | Self::PasswordHash(_)
            | Self::Session(_) => None,
        }
    }

    /// HTTP status used when a form is re-rendered with this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFields
            | Self::PasswordTooShort { .. }
            | Self::PasswordMismatch
            | Self::InvalidPhone(_) => StatusCode::BAD_REQUEST,
            Self::PhoneTaken => StatusCode::CONFLICT,
            Self::RegistrationDisabled => StatusCode::FORBIDDEN,
            Self::InvalidCredentials | Self::Unauthenticated | Self::StaleSession => {
                StatusCode::UNAUTHORIZED
            }
            Self::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::PasswordHash(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this is an infrastructure failure worth an error-level log.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Repository(_) | Self::PasswordHash(_) | Self::Session(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_have_user_messages() {
        assert_eq!(
            AuthError::PasswordTooShort { min: 8 }.user_message().as_deref(),
            Some("Password must be at least 8 characters")
        );
        assert_eq!(
            AuthError::InvalidCredentials.user_message().as_deref(),
            Some("Invalid phone number or password")
        );
    }

    #[test]
    fn test_infrastructure_errors_are_hidden() {
        let err = AuthError::Repository(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        assert!(err.user_message().is_none());
        assert!(err.is_internal());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::RegistrationDisabled.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AuthError::PhoneTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::MissingFields.status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
