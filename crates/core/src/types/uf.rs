//! Brazilian state code (UF) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Uf`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UfError {
    /// The input string is empty.
    #[error("state code cannot be empty")]
    Empty,
    /// The input is not exactly 2 characters.
    #[error("state code must have exactly 2 letters")]
    WrongLength,
    /// The input contains characters other than ASCII uppercase letters.
    #[error("state code must be 2 uppercase letters")]
    NotUppercaseLetters,
}

/// A two-letter Brazilian federative-unit code (e.g. `SP`, `RJ`).
///
/// ## Examples
///
/// ```
/// use movase_core::Uf;
///
/// assert!(Uf::parse("SP").is_ok());
/// assert!(Uf::parse("sp").is_err());
/// assert!(Uf::parse("SAO").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Uf(String);

impl Uf {
    /// Parse a `Uf` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is exactly 2 ASCII uppercase
    /// letters.
    pub fn parse(s: &str) -> Result<Self, UfError> {
        if s.is_empty() {
            return Err(UfError::Empty);
        }

        if s.chars().count() != 2 {
            return Err(UfError::WrongLength);
        }

        if !s.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(UfError::NotUppercaseLetters);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the state code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Uf {
    type Err = UfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Uf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Uf::parse("SP").unwrap().as_str(), "SP");
        assert_eq!(Uf::parse("RJ").unwrap().as_str(), "RJ");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Uf::parse(""), Err(UfError::Empty)));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(Uf::parse("S"), Err(UfError::WrongLength)));
        assert!(matches!(Uf::parse("SAO"), Err(UfError::WrongLength)));
    }

    #[test]
    fn test_parse_lowercase_rejected() {
        assert!(matches!(Uf::parse("sp"), Err(UfError::NotUppercaseLetters)));
    }

    #[test]
    fn test_parse_digits_rejected() {
        assert!(matches!(Uf::parse("S1"), Err(UfError::NotUppercaseLetters)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Uf::parse("MG").unwrap().to_string(), "MG");
    }
}
