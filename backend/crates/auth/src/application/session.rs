//! Session Use Case
//!
//! Resolves a session token to the signed-in user. Expired sessions are
//! removed on sight; live ones get their expiry pushed forward at most once
//! per `session_update_age`.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::domain::entity::{SessionPatch, User};
use crate::domain::repository::AuthAdapter;
use crate::domain::value_object::UserId;
use crate::error::AuthResult;

/// The user as exposed on a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.map(|e| e.as_str().to_string()),
            image: user.image,
        }
    }
}

/// A live session
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
    /// Whether the expiry was extended by this lookup
    pub refreshed: bool,
}

/// Session lookup use case
pub struct SessionUseCase<R>
where
    R: AuthAdapter,
{
    adapter: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> SessionUseCase<R>
where
    R: AuthAdapter,
{
    pub fn new(adapter: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { adapter, config }
    }

    /// `None` when the token is unknown or the session has expired
    pub async fn execute(&self, session_token: &str) -> AuthResult<Option<ActiveSession>> {
        self.execute_at(session_token, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        session_token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<ActiveSession>> {
        let Some(found) = self.adapter.get_session_and_user(session_token).await? else {
            return Ok(None);
        };

        if found.session.is_expired(now) {
            self.adapter.delete_session(session_token).await?;
            tracing::debug!(user_id = %found.user.id, "Expired session removed");
            return Ok(None);
        }

        let mut expires = found.session.expires;
        let mut refreshed = false;

        if let Some(new_expiry) = found.session.refreshed_expiry(
            now,
            self.config.session_max_age_chrono(),
            self.config.session_update_age_chrono(),
        ) {
            match self
                .adapter
                .update_session(SessionPatch::extend(session_token, new_expiry))
                .await?
            {
                Some(updated) => {
                    expires = updated.expires;
                    refreshed = true;
                    tracing::debug!(user_id = %updated.user_id, "Session extended");
                }
                // signed out concurrently
                None => return Ok(None),
            }
        }

        Ok(Some(ActiveSession {
            user: found.user.into(),
            expires,
            refreshed,
        }))
    }
}
