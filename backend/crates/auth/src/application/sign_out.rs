//! Sign Out Use Case
//!
//! Invalidates a user session.

use std::sync::Arc;

use crate::domain::entity::Session;
use crate::domain::repository::AuthAdapter;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<R>
where
    R: AuthAdapter,
{
    adapter: Arc<R>,
}

impl<R> SignOutUseCase<R>
where
    R: AuthAdapter,
{
    pub fn new(adapter: Arc<R>) -> Self {
        Self { adapter }
    }

    /// Delete the session; an unknown token is not an error
    pub async fn execute(&self, session_token: &str) -> AuthResult<Option<Session>> {
        let deleted = self.adapter.delete_session(session_token).await?;

        if let Some(session) = &deleted {
            tracing::info!(user_id = %session.user_id, "User signed out");
        }

        Ok(deleted)
    }
}
