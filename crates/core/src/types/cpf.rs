//! Brazilian individual taxpayer id (CPF) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Cpf`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CpfError {
    /// The input string is empty.
    #[error("CPF cannot be empty")]
    Empty,
    /// The input does not contain exactly 11 digits.
    #[error("CPF must have exactly 11 digits (got {got})")]
    WrongLength {
        /// Number of digits found after stripping separators.
        got: usize,
    },
    /// All 11 digits are identical (e.g. `111.111.111-11`).
    ///
    /// Such sequences satisfy a naive mod-11 check but are not valid CPFs.
    #[error("CPF with repeated digits is invalid")]
    RepeatedDigits,
    /// One of the two check digits does not match the computed value.
    #[error("CPF check digit mismatch")]
    InvalidCheckDigit,
}

/// A Brazilian individual taxpayer registry number (CPF).
///
/// Validated on construction: 11 digits, not all identical, and both
/// check digits verified with the two-pass weighted-sum mod-11 algorithm.
///
/// ## Examples
///
/// ```
/// use movase_core::Cpf;
///
/// let cpf = Cpf::parse("529.982.247-25").unwrap();
/// assert_eq!(cpf.as_str(), "52998224725");
/// assert_eq!(cpf.to_string(), "529.982.247-25");
///
/// assert!(Cpf::parse("111.111.111-11").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cpf(String);

impl Cpf {
    /// Number of digits in a CPF.
    pub const LENGTH: usize = 11;

    /// Parse a `Cpf` from a string, stripping non-digit characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, does not contain exactly
    /// 11 digits, has all digits identical, or fails check-digit validation.
    pub fn parse(s: &str) -> Result<Self, CpfError> {
        if s.is_empty() {
            return Err(CpfError::Empty);
        }

        let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();

        if digits.len() != Self::LENGTH {
            return Err(CpfError::WrongLength { got: digits.len() });
        }

        if digits.iter().all(|&d| d == digits[0]) {
            return Err(CpfError::RepeatedDigits);
        }

        // First check digit: weights 10..2 over the 9 body digits.
        if check_digit(&digits[..9], 10) != digits[9] {
            return Err(CpfError::InvalidCheckDigit);
        }

        // Second check digit: weights 11..2 over the 10 digits including
        // the first check digit.
        if check_digit(&digits[..10], 11) != digits[10] {
            return Err(CpfError::InvalidCheckDigit);
        }

        Ok(Self(digits.iter().map(ToString::to_string).collect()))
    }

    /// Returns the bare 11-digit form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Cpf` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the display form `000.000.000-00`.
    #[must_use]
    pub fn formatted(&self) -> String {
        let s = &self.0;
        format!("{}.{}.{}-{}", &s[..3], &s[3..6], &s[6..9], &s[9..])
    }
}

/// Weighted-sum mod-11 check digit over `digits`, with the first weight
/// being `start_weight` and descending to 2. A remainder of 10 or 11 maps
/// to 0.
fn check_digit(digits: &[u32], start_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=start_weight).rev())
        .map(|(d, w)| d * w)
        .sum();

    let rest = 11 - (sum % 11);
    if rest >= 10 { 0 } else { rest }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl std::str::FromStr for Cpf {
    type Err = CpfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Cpf {
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
        assert!(Cpf::parse("529.982.247-25").is_ok());
        assert!(Cpf::parse("52998224725").is_ok());
    }

    #[test]
    fn test_parse_strips_separators() {
        let cpf = Cpf::parse("529.982.247-25").unwrap();
        assert_eq!(cpf.as_str(), "52998224725");
    }

    #[test]
    fn test_repeated_digits_rejected() {
        // Coincidentally satisfies a naive mod-11 check, must still fail.
        assert!(matches!(
            Cpf::parse("111.111.111-11"),
            Err(CpfError::RepeatedDigits)
        ));
        assert!(matches!(
            Cpf::parse("00000000000"),
            Err(CpfError::RepeatedDigits)
        ));
    }

    #[test]
    fn test_altered_last_digit_rejected() {
        assert!(matches!(
            Cpf::parse("529.982.247-24"),
            Err(CpfError::InvalidCheckDigit)
        ));
    }

    #[test]
    fn test_altered_first_check_digit_rejected() {
        assert!(matches!(
            Cpf::parse("529.982.247-35"),
            Err(CpfError::InvalidCheckDigit)
        ));
    }

    #[test]
    fn test_wrong_length() {
        assert!(matches!(
            Cpf::parse("1234567890"),
            Err(CpfError::WrongLength { got: 10 })
        ));
    }

    #[test]
    fn test_empty() {
        assert!(matches!(Cpf::parse(""), Err(CpfError::Empty)));
    }

    #[test]
    fn test_display_formatted() {
        let cpf = Cpf::parse("52998224725").unwrap();
        assert_eq!(cpf.to_string(), "529.982.247-25");
    }

    #[test]
    fn test_serde_roundtrip() {
        let cpf = Cpf::parse("529.982.247-25").unwrap();
        let json = serde_json::to_string(&cpf).unwrap();
        assert_eq!(json, "\"52998224725\"");

        let parsed: Cpf = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cpf);
    }
}
