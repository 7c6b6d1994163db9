//! In-Memory Adapter
//!
//! Typed maps behind one `tokio::sync::RwLock`. Enforces the same unique keys,
//! foreign keys and cascades as the PostgreSQL schema so both adapters behave
//! identically. Data lives as long as the last clone of the adapter.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entity::{
    Account, NewAccount, NewSession, NewUser, Session, SessionAndUser, SessionPatch, User,
    UserPatch, VerificationToken,
};
use crate::domain::repository::{
    AccountRepository, SessionRepository, UserRepository, VerificationTokenRepository,
};
use crate::domain::value_object::{AccountId, SessionId, UserId, email::Email};
use crate::error::{AuthError, AuthResult};
use crate::infra::postgres::ExpiredCleanup;

#[derive(Debug, Default)]
struct Store {
    users: HashMap<UserId, User>,
    accounts: HashMap<AccountId, Account>,
    sessions: HashMap<SessionId, Session>,
    verification_tokens: HashMap<(String, String), VerificationToken>,
}

impl Store {
    fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.as_ref() == Some(email))
    }

    fn require_user(&self, id: UserId) -> AuthResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(AuthError::Conflict(format!("user {id} does not exist")))
        }
    }

    fn account_by_provider(&self, provider: &str, provider_account_id: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.matches(provider, provider_account_id))
    }

    fn session_by_token(&self, session_token: &str) -> Option<&Session> {
        self.sessions
            .values()
            .find(|s| s.session_token == session_token)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryAuthAdapter {
    store: Arc<RwLock<Store>>,
}

impl MemoryAuthAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete expired sessions and verification tokens
    pub async fn cleanup_expired(&self) -> ExpiredCleanup {
        let now = Utc::now();
        let mut store = self.store.write().await;

        let sessions_before = store.sessions.len();
        store.sessions.retain(|_, s| !s.is_expired(now));
        let tokens_before = store.verification_tokens.len();
        store.verification_tokens.retain(|_, t| !t.is_expired(now));

        ExpiredCleanup {
            sessions: (sessions_before - store.sessions.len()) as u64,
            verification_tokens: (tokens_before - store.verification_tokens.len()) as u64,
        }
    }

    /// Number of stored accounts (test helper)
    pub async fn account_count(&self) -> usize {
        self.store.read().await.accounts.len()
    }

    /// Number of stored sessions (test helper)
    pub async fn session_count(&self) -> usize {
        self.store.read().await.sessions.len()
    }
}

impl UserRepository for MemoryAuthAdapter {
    async fn create_user(&self, user: NewUser) -> AuthResult<User> {
        let mut store = self.store.write().await;

        if let Some(email) = &user.email {
            if store.email_taken(email, None) {
                return Err(AuthError::Conflict(format!("email {email} already in use")));
            }
        }

        let id = UserId::new();
        store.users.insert(id, user.into_user(id));

        let created = store
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AuthError::inconsistency("created user could not be read back"))?;

        tracing::info!(user_id = %id, "User created");

        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> AuthResult<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let store = self.store.read().await;
        let mut matches = store
            .users
            .values()
            .filter(|u| u.email.as_ref().is_some_and(|e| e.matches(email)));

        let found = matches.next().cloned();
        if matches.next().is_some() {
            return Err(AuthError::inconsistency(
                "more than one user shares an email address",
            ));
        }
        Ok(found)
    }

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AuthResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .account_by_provider(provider, provider_account_id)
            .and_then(|a| store.users.get(&a.user_id))
            .cloned())
    }

    async fn update_user(&self, patch: UserPatch) -> AuthResult<User> {
        let id = patch
            .id
            .ok_or_else(|| AuthError::inconsistency("update_user called without an id"))?;

        let mut store = self.store.write().await;

        if let Some(Some(email)) = &patch.email {
            if store.email_taken(email, Some(id)) {
                return Err(AuthError::Conflict(format!("email {email} already in use")));
            }
        }

        let user = store.users.get_mut(&id).ok_or_else(|| {
            AuthError::inconsistency(format!("update_user matched no user with id {id}"))
        })?;
        patch.apply_to(user);

        tracing::info!(user_id = %id, "User updated");

        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> AuthResult<Option<User>> {
        let mut store = self.store.write().await;

        let Some(user) = store.users.remove(&id) else {
            return Ok(None);
        };
        store.accounts.retain(|_, a| a.user_id != id);
        store.sessions.retain(|_, s| s.user_id != id);

        tracing::info!(user_id = %id, "User deleted");

        Ok(Some(user))
    }
}

impl AccountRepository for MemoryAuthAdapter {
    async fn link_account(&self, account: NewAccount) -> AuthResult<Account> {
        let mut store = self.store.write().await;

        store.require_user(account.user_id)?;
        if store
            .account_by_provider(&account.provider, &account.provider_account_id)
            .is_some()
        {
            return Err(AuthError::Conflict(format!(
                "{} account {} is already linked",
                account.provider, account.provider_account_id
            )));
        }

        let id = AccountId::new();
        let linked = account.into_account(id);
        store.accounts.insert(id, linked.clone());

        tracing::info!(
            user_id = %linked.user_id,
            provider = %linked.provider,
            "Account linked"
        );

        Ok(linked)
    }

    async fn unlink_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AuthResult<Option<Account>> {
        let mut store = self.store.write().await;

        let Some(id) = store
            .account_by_provider(provider, provider_account_id)
            .map(|a| a.id)
        else {
            return Ok(None);
        };
        let account = store.accounts.remove(&id);

        if let Some(account) = &account {
            tracing::info!(
                user_id = %account.user_id,
                provider = %account.provider,
                "Account unlinked"
            );
        }

        Ok(account)
    }
}

impl SessionRepository for MemoryAuthAdapter {
    async fn create_session(&self, session: NewSession) -> AuthResult<Session> {
        let mut store = self.store.write().await;

        store.require_user(session.user_id)?;
        if store.session_by_token(&session.session_token).is_some() {
            return Err(AuthError::Conflict("duplicate session token".to_string()));
        }

        let id = SessionId::new();
        let created = session.into_session(id);
        store.sessions.insert(id, created.clone());

        tracing::info!(user_id = %created.user_id, "Session created");

        Ok(created)
    }

    async fn get_session_and_user(
        &self,
        session_token: &str,
    ) -> AuthResult<Option<SessionAndUser>> {
        let store = self.store.read().await;

        let Some(session) = store.session_by_token(session_token) else {
            return Ok(None);
        };
        Ok(store.users.get(&session.user_id).map(|user| SessionAndUser {
            session: session.clone(),
            user: user.clone(),
        }))
    }

    async fn update_session(&self, patch: SessionPatch) -> AuthResult<Option<Session>> {
        let mut store = self.store.write().await;

        if let Some(user_id) = patch.user_id {
            store.require_user(user_id)?;
        }

        Ok(store
            .sessions
            .values_mut()
            .find(|s| s.session_token == patch.session_token)
            .map(|session| {
                patch.apply_to(session);
                session.clone()
            }))
    }

    async fn delete_session(&self, session_token: &str) -> AuthResult<Option<Session>> {
        let mut store = self.store.write().await;

        let Some(id) = store.session_by_token(session_token).map(|s| s.id) else {
            return Ok(None);
        };
        let session = store.sessions.remove(&id);

        if let Some(session) = &session {
            tracing::info!(user_id = %session.user_id, "Session deleted");
        }

        Ok(session)
    }
}

impl VerificationTokenRepository for MemoryAuthAdapter {
    async fn create_verification_token(
        &self,
        token: VerificationToken,
    ) -> AuthResult<VerificationToken> {
        let mut store = self.store.write().await;

        let key = (token.identifier.clone(), token.token.clone());
        if store.verification_tokens.contains_key(&key) {
            return Err(AuthError::Conflict(
                "duplicate verification token".to_string(),
            ));
        }
        store.verification_tokens.insert(key.clone(), token);

        store
            .verification_tokens
            .get(&key)
            .cloned()
            .ok_or_else(|| {
                AuthError::inconsistency("created verification token could not be read back")
            })
    }

    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> AuthResult<Option<VerificationToken>> {
        let key = (identifier.to_string(), token.to_string());
        Ok(self.store.read().await.verification_tokens.get(&key).cloned())
    }
}
