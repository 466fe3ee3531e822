//! Brazilian postal code (CEP) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Cep`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CepError {
    /// The input string is empty.
    #[error("CEP cannot be empty")]
    Empty,
    /// The input does not contain exactly 8 digits.
    #[error("CEP must have exactly 8 digits (got {got})")]
    WrongLength {
        /// Number of digits found after stripping separators.
        got: usize,
    },
}

/// A Brazilian postal code (CEP).
///
/// Stored as the bare 8-digit form; any non-digit characters (hyphens,
/// dots, spaces) are stripped during parsing.
///
/// ## Examples
///
/// ```
/// use movase_core::Cep;
///
/// let cep = Cep::parse("01001-000").unwrap();
/// assert_eq!(cep.as_str(), "01001000");
/// assert_eq!(cep.to_string(), "01001-000");
///
/// assert!(Cep::parse("1234").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cep(String);

impl Cep {
    /// Number of digits in a CEP.
    pub const LENGTH: usize = 8;

    /// Parse a `Cep` from a string, stripping non-digit characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or does not contain exactly
    /// 8 digits after stripping separators.
    pub fn parse(s: &str) -> Result<Self, CepError> {
        if s.is_empty() {
            return Err(CepError::Empty);
        }

        let digits: String = s.chars().filter(char::is_ascii_digit).collect();

        if digits.len() != Self::LENGTH {
            return Err(CepError::WrongLength { got: digits.len() });
        }

        Ok(Self(digits))
    }

    /// Returns the bare 8-digit form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Cep` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the display form with a hyphen after the fifth digit
    /// (`00000-000`).
    #[must_use]
    pub fn formatted(&self) -> String {
        let (prefix, suffix) = self.0.split_at(5);
        format!("{prefix}-{suffix}")
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl std::str::FromStr for Cep {
    type Err = CepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Cep {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_digits() {
        let cep = Cep::parse("01001000").unwrap();
        assert_eq!(cep.as_str(), "01001000");
    }

    #[test]
    fn test_parse_strips_separators() {
        let cep = Cep::parse("01001-000").unwrap();
        assert_eq!(cep.as_str(), "01001000");

        let cep = Cep::parse("01.001-000").unwrap();
        assert_eq!(cep.as_str(), "01001000");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Cep::parse(""), Err(CepError::Empty)));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            Cep::parse("1234"),
            Err(CepError::WrongLength { got: 4 })
        ));
        assert!(matches!(
            Cep::parse("123456789"),
            Err(CepError::WrongLength { got: 9 })
        ));
    }

    #[test]
    fn test_parse_non_digits_only() {
        assert!(matches!(
            Cep::parse("abc-def"),
            Err(CepError::WrongLength { got: 0 })
        ));
    }

    #[test]
    fn test_display_hyphenated() {
        let cep = Cep::parse("01001000").unwrap();
        assert_eq!(cep.to_string(), "01001-000");
        assert_eq!(cep.formatted(), "01001-000");
    }

    #[test]
    fn test_serde_roundtrip() {
        let cep = Cep::parse("04538132").unwrap();
        let json = serde_json::to_string(&cep).unwrap();
        assert_eq!(json, "\"04538132\"");

        let parsed: Cep = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cep);
    }

    #[test]
    fn test_from_str() {
        let cep: Cep = "01310-100".parse().unwrap();
        assert_eq!(cep.as_str(), "01310100");
    }
}
