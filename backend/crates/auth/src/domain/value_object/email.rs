//! Email Value Object
//!
//! Emails are stored trimmed and lowercased so that lookups can be
//! case-insensitive. Validation is shallow on purpose: the identity provider
//! has already verified (or not) the address.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Deserializing goes through [`Email::new`], so every `Email` is normalized
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Normalize and validate
    pub fn new(email: impl AsRef<str>) -> AppResult<Self> {
        let email = Self::normalize(email.as_ref());

        if email.is_empty() {
            return Err(AppError::bad_request("Email cannot be empty"));
        }

        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }

        match email.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(email))
            }
            _ => Err(AppError::bad_request("Invalid email format")),
        }
    }

    /// Canonical form used for storage and comparison
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// Create from a stored value, which the adapters write normalized
    pub(crate) fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against an arbitrary input
    pub fn matches(&self, raw: &str) -> bool {
        self.0 == Self::normalize(raw)
    }
}

impl FromStr for Email {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Email::new(s)
    }
}

impl TryFrom<String> for Email {
    type Error = AppError;

    fn try_from(value: String) -> AppResult<Self> {
        Email::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_lowercased() {
        let email = Email::new("  A@B.com ").unwrap();
        assert_eq!(email.as_str(), "a@b.com");
    }

    #[test]
    fn test_email_invalid() {
        assert!(Email::new("").is_err());
        assert!(Email::new("   ").is_err());
        assert!(Email::new("userexample.com").is_err());
        assert!(Email::new("user@").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("user@@example.com").is_err());
        assert!(Email::new(format!("{}@x.io", "a".repeat(260))).is_err());
    }

    #[test]
    fn test_email_matches_case_insensitively() {
        let email = Email::new("User@Example.COM").unwrap();
        assert!(email.matches("user@example.com"));
        assert!(email.matches("USER@EXAMPLE.COM"));
        assert!(!email.matches("other@example.com"));
    }

    #[test]
    fn test_email_deserialize_normalizes() {
        let email: Email = serde_json::from_str("\" Ada@Example.COM \"").unwrap();
        assert_eq!(email.as_str(), "ada@example.com");
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"ada@example.com\"");
    }

    #[test]
    fn test_email_deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
    }
}
