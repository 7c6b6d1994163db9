//! Repository Traits
//!
//! The adapter contract. Lookups return `Ok(None)` when nothing matches;
//! errors are reserved for storage failures and broken invariants.

use crate::domain::entity::{
    Account, NewAccount, NewSession, NewUser, Session, SessionAndUser, SessionPatch, User,
    UserPatch, VerificationToken,
};
use crate::domain::value_object::UserId;
use crate::error::AuthResult;

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a user and return it as stored
    async fn create_user(&self, user: NewUser) -> AuthResult<User>;

    async fn get_user(&self, id: UserId) -> AuthResult<Option<User>>;

    /// Case-insensitive lookup; more than one match is an inconsistency
    async fn get_user_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Owner of the account `(provider, provider_account_id)`
    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AuthResult<Option<User>>;

    /// Write the fields present in `patch`; `patch.id` is required
    async fn update_user(&self, patch: UserPatch) -> AuthResult<User>;

    /// Remove a user with its accounts and sessions, returning the removed row
    async fn delete_user(&self, id: UserId) -> AuthResult<Option<User>>;
}

#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    async fn link_account(&self, account: NewAccount) -> AuthResult<Account>;

    /// Remove the account, returning it; `None` if it was never linked
    async fn unlink_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AuthResult<Option<Account>>;
}

#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn create_session(&self, session: NewSession) -> AuthResult<Session>;

    async fn get_session_and_user(&self, session_token: &str)
    -> AuthResult<Option<SessionAndUser>>;

    /// Apply `patch`; a session that vanished meanwhile yields `None`
    async fn update_session(&self, patch: SessionPatch) -> AuthResult<Option<Session>>;

    async fn delete_session(&self, session_token: &str) -> AuthResult<Option<Session>>;
}

#[trait_variant::make(VerificationTokenRepository: Send)]
pub trait LocalVerificationTokenRepository {
    async fn create_verification_token(
        &self,
        token: VerificationToken,
    ) -> AuthResult<VerificationToken>;

    /// Look up a token by its composite key. The token is not consumed.
    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> AuthResult<Option<VerificationToken>>;
}

/// Everything the sign-in flow and route handlers need from storage
pub trait AuthAdapter:
    UserRepository
    + AccountRepository
    + SessionRepository
    + VerificationTokenRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthAdapter for T where
    T: UserRepository
        + AccountRepository
        + SessionRepository
        + VerificationTokenRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
