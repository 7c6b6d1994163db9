//! Account Entity
//!
//! A provider identity linked to a user. `(provider, provider_account_id)` is
//! unique across all accounts.

use crate::domain::value_object::{AccountId, UserId, account_type::AccountType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub account_type: AccountType,
    /// Provider id, e.g. `discord`
    pub provider: String,
    /// The user's id at the provider
    pub provider_account_id: String,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    /// Access token expiry (unix seconds)
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
}

/// Fields for [`link_account`](crate::domain::repository::AccountRepository::link_account)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub user_id: UserId,
    pub account_type: AccountType,
    pub provider: String,
    pub provider_account_id: String,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
}

impl NewAccount {
    /// Account with no tokens attached
    pub fn new(
        user_id: UserId,
        account_type: AccountType,
        provider: impl Into<String>,
        provider_account_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            account_type,
            provider: provider.into(),
            provider_account_id: provider_account_id.into(),
            refresh_token: None,
            access_token: None,
            expires_at: None,
            token_type: None,
            scope: None,
            id_token: None,
            session_state: None,
        }
    }

    pub fn into_account(self, id: AccountId) -> Account {
        Account {
            id,
            user_id: self.user_id,
            account_type: self.account_type,
            provider: self.provider,
            provider_account_id: self.provider_account_id,
            refresh_token: self.refresh_token,
            access_token: self.access_token,
            expires_at: self.expires_at,
            token_type: self.token_type,
            scope: self.scope,
            id_token: self.id_token,
            session_state: self.session_state,
        }
    }
}

impl Account {
    pub fn matches(&self, provider: &str, provider_account_id: &str) -> bool {
        self.provider == provider && self.provider_account_id == provider_account_id
    }
}
