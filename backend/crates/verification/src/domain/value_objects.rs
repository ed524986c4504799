//! Domain Value Objects
//!
//! Immutable, validated value types for the verification domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VerificationError;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Email address value object
///
/// Basic validation only; proving control of the address is what the
/// verification challenge is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Trims, lower-cases and validates
    pub fn new(email: impl Into<String>) -> Result<Self, VerificationError> {
        let email = email.into().trim().to_lowercase();

        if email.is_empty() {
            return Err(VerificationError::InvalidEmail(
                "email cannot be empty".to_string(),
            ));
        }

        if email.len() > EMAIL_MAX_LENGTH {
            return Err(VerificationError::InvalidEmail(format!(
                "email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }

        if !Self::is_valid_format(&email) {
            return Err(VerificationError::InvalidEmail(
                "invalid email format".to_string(),
            ));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > 64 || domain.contains('@') {
            return false;
        }

        if domain.is_empty() || !domain.contains('.') {
            return false;
        }

        if !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return false;
        }

        !(domain.starts_with('.')
            || domain.ends_with('.')
            || domain.starts_with('-')
            || domain.ends_with('-'))
    }

    /// Create from a stored value (assumed already validated).
    ///
    /// Other services may have written the address with its original
    /// casing, so it is normalized the same way as `new`.
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Email {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Email::new(s)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Number of digits in a verification code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeLength(u8);

impl CodeLength {
    pub const DEFAULT: CodeLength = CodeLength(4);
    pub const MIN: u8 = 4;
    pub const MAX: u8 = 10;

    pub fn new(digits: u8) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&digits) {
            Some(Self(digits))
        } else {
            None
        }
    }

    pub fn get(&self) -> usize {
        self.0 as usize
    }
}

impl Default for CodeLength {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<CodeLength> for u8 {
    fn from(len: CodeLength) -> Self {
        len.0
    }
}

/// A freshly generated code: exactly `CodeLength` ASCII digits.
///
/// `Debug` is redacted so codes never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    pub fn parse(code: &str, length: CodeLength) -> Option<Self> {
        (code.len() == length.get() && code.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerificationCode({})", "*".repeat(self.0.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("a@b.com").is_ok());
        assert!(Email::new("user.name+tag@example.co.jp").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        assert!(Email::new("").is_err());
        assert!(Email::new("   ").is_err());
        assert!(Email::new("userexample.com").is_err());
        assert!(Email::new("user@").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("user@@example.com").is_err());
        assert!(Email::new("user@example").is_err());
        assert!(Email::new("user@-example.com").is_err());
    }

    #[test]
    fn test_email_normalization() {
        let email = Email::new("  User@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_stored_email_is_normalized() {
        assert_eq!(Email::from_db("A@b.com"), Email::new("a@b.com").unwrap());
        assert_eq!(Email::from_db(" User@Example.COM").as_str(), "user@example.com");
    }

    #[test]
    fn test_code_length_bounds() {
        assert_eq!(CodeLength::default().get(), 4);
        assert!(CodeLength::new(3).is_none());
        assert!(CodeLength::new(6).is_some());
        assert!(CodeLength::new(11).is_none());
    }

    #[test]
    fn test_code_parse() {
        let four = CodeLength::DEFAULT;
        assert!(VerificationCode::parse("7421", four).is_some());
        assert!(VerificationCode::parse("0000", four).is_some());
        assert!(VerificationCode::parse("742", four).is_none());
        assert!(VerificationCode::parse("74210", four).is_none());
        assert!(VerificationCode::parse("12a4", four).is_none());
        assert!(VerificationCode::parse("١٢٣٤", four).is_none());
    }

    #[test]
    fn test_code_debug_is_redacted() {
        let code = VerificationCode::parse("7421", CodeLength::DEFAULT).unwrap();
        assert_eq!(format!("{:?}", code), "VerificationCode(****)");
    }
}
