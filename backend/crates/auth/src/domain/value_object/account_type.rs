//! Account Type Value Object
//!
//! How a linked account authenticates. Stored as lowercase text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    OAuth,
    Oidc,
    Email,
    Credentials,
}

impl AccountType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccountType::OAuth => "oauth",
            AccountType::Oidc => "oidc",
            AccountType::Email => "email",
            AccountType::Credentials => "credentials",
        }
    }
}

impl FromStr for AccountType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oauth" => Ok(AccountType::OAuth),
            "oidc" => Ok(AccountType::Oidc),
            "email" => Ok(AccountType::Email),
            "credentials" => Ok(AccountType::Credentials),
            other => Err(AuthError::InvalidInput(format!("unknown account type: {other}"))),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_variants() {
        for ty in [
            AccountType::OAuth,
            AccountType::Oidc,
            AccountType::Email,
            AccountType::Credentials,
        ] {
            assert_eq!(ty.as_str().parse::<AccountType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!(
            "saml".parse::<AccountType>(),
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&AccountType::OAuth).unwrap(), "\"oauth\"");
    }
}
