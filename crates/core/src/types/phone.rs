//! Phone number type used as the administrator login key.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is empty once surrounding whitespace is removed.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input is longer than any phone number we accept.
    #[error("phone number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A phone number, trimmed of surrounding whitespace.
///
/// Lookups by phone are exact matches on the trimmed value, so
/// `" 5551234567 "` and `"5551234567"` identify the same administrator while
/// `"555-123-4567"` does not.
///
/// ```
/// use monitor_panel_core::Phone;
///
/// let phone = Phone::parse("  5551234567\n").unwrap();
/// assert_eq!(phone.as_str(), "5551234567");
///
/// assert!(Phone::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Maximum length of a phone number (E.164 plus generous formatting room).
    pub const MAX_LENGTH: usize = 32;

    /// Parse a `Phone` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Phone::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(PhoneError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let phone = Phone::parse(" \t5551234567 \n").unwrap();
        assert_eq!(phone.as_str(), "5551234567");
    }

    #[test]
    fn test_parse_keeps_inner_formatting() {
        let phone = Phone::parse("+1 555 123 4567").unwrap();
        assert_eq!(phone.as_str(), "+1 555 123 4567");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("    "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "9".repeat(Phone::MAX_LENGTH + 1);
        assert!(matches!(
            Phone::parse(&long),
            Err(PhoneError::TooLong { .. })
        ));
        assert!(Phone::parse(&"9".repeat(Phone::MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_from_str() {
        let phone: Phone = "0000000000".parse().unwrap();
        assert_eq!(phone.to_string(), "0000000000");
    }
}
