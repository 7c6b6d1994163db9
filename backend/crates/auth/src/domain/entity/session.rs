//! Session Entity
//!
//! Database session referenced by an opaque token held in a cookie.

use chrono::{DateTime, Duration, Utc};

use crate::domain::entity::user::User;
use crate::domain::value_object::{SessionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    /// Opaque token stored in the session cookie; unique
    pub session_token: String,
    pub user_id: UserId,
    pub expires: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    /// New expiry if the session is due for a sliding refresh
    ///
    /// A session is refreshed once `update_age` has passed since it was last
    /// issued or extended, i.e. when `now >= expires - max_age + update_age`.
    pub fn refreshed_expiry(
        &self,
        now: DateTime<Utc>,
        max_age: Duration,
        update_age: Duration,
    ) -> Option<DateTime<Utc>> {
        let due_at = self.expires - max_age + update_age;
        (now >= due_at).then(|| now + max_age)
    }
}

/// Fields for [`create_session`](crate::domain::repository::SessionRepository::create_session)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub session_token: String,
    pub user_id: UserId,
    pub expires: DateTime<Utc>,
}

impl NewSession {
    pub fn into_session(self, id: SessionId) -> Session {
        Session {
            id,
            session_token: self.session_token,
            user_id: self.user_id,
            expires: self.expires,
        }
    }
}

/// Partial session update, addressed by token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPatch {
    pub session_token: String,
    pub expires: Option<DateTime<Utc>>,
    pub user_id: Option<UserId>,
}

impl SessionPatch {
    pub fn extend(session_token: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            session_token: session_token.into(),
            expires: Some(expires),
            user_id: None,
        }
    }

    pub fn apply_to(&self, session: &mut Session) {
        if let Some(expires) = self.expires {
            session.expires = expires;
        }
        if let Some(user_id) = self.user_id {
            session.user_id = user_id;
        }
    }
}

/// A session together with the user it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAndUser {
    pub session: Session,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring_at(expires: DateTime<Utc>) -> Session {
        NewSession {
            session_token: "tok".into(),
            user_id: UserId::new(),
            expires,
        }
        .into_session(SessionId::new())
    }

    #[test]
    fn test_is_expired_at_boundary() {
        let now = Utc::now();
        assert!(session_expiring_at(now).is_expired(now));
        assert!(!session_expiring_at(now + Duration::seconds(1)).is_expired(now));
    }

    #[test]
    fn test_refresh_not_due_for_fresh_session() {
        let now = Utc::now();
        let max_age = Duration::days(30);
        let session = session_expiring_at(now + max_age);
        assert_eq!(
            session.refreshed_expiry(now, max_age, Duration::hours(24)),
            None
        );
    }

    #[test]
    fn test_refresh_due_after_update_age() {
        let now = Utc::now();
        let max_age = Duration::days(30);
        // issued 25 hours ago
        let session = session_expiring_at(now + max_age - Duration::hours(25));
        assert_eq!(
            session.refreshed_expiry(now, max_age, Duration::hours(24)),
            Some(now + max_age)
        );
    }

    #[test]
    fn test_patch_applies_expiry_only() {
        let now = Utc::now();
        let mut session = session_expiring_at(now);
        let user_id = session.user_id;
        SessionPatch::extend("tok", now + Duration::days(1)).apply_to(&mut session);
        assert_eq!(session.expires, now + Duration::days(1));
        assert_eq!(session.user_id, user_id);
    }
}
