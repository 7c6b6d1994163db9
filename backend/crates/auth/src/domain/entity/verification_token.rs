//! Verification Token Entity
//!
//! One-time credential for passwordless sign-in, keyed by
//! `(identifier, token)`. Reading a token does not consume it.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken {
    /// Usually the email address the token was sent to
    pub identifier: String,
    pub token: String,
    pub expires: DateTime<Utc>,
}

impl VerificationToken {
    pub fn new(
        identifier: impl Into<String>,
        token: impl Into<String>,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            token: token.into(),
            expires,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    pub fn matches(&self, identifier: &str, token: &str) -> bool {
        self.identifier == identifier && self.token == token
    }
}
