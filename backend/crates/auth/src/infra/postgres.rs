//! PostgreSQL Adapter
//!
//! Each operation is an independent round trip on the shared pool. Writes are
//! followed by a re-read so callers always get the row as stored.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    Account, NewAccount, NewSession, NewUser, Session, SessionAndUser, SessionPatch, User,
    UserPatch, VerificationToken,
};
use crate::domain::repository::{
    AccountRepository, SessionRepository, UserRepository, VerificationTokenRepository,
};
use crate::domain::value_object::{
    AccountId, SessionId, UserId, account_type::AccountType, email::Email,
};
use crate::error::{AuthError, AuthResult};

/// Rows removed by [`PgAuthAdapter::cleanup_expired`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiredCleanup {
    pub sessions: u64,
    pub verification_tokens: u64,
}

/// PostgreSQL-backed auth adapter
#[derive(Clone)]
pub struct PgAuthAdapter {
    pool: PgPool,
}

impl PgAuthAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Delete expired sessions and verification tokens
    pub async fn cleanup_expired(&self) -> AuthResult<ExpiredCleanup> {
        let now = Utc::now();

        let sessions = sqlx::query("DELETE FROM sessions WHERE expires <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        let verification_tokens = sqlx::query("DELETE FROM verification_tokens WHERE expires <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(
            sessions_deleted = sessions,
            verification_tokens_deleted = verification_tokens,
            "Cleaned up expired sessions and verification tokens"
        );

        Ok(ExpiredCleanup {
            sessions,
            verification_tokens,
        })
    }

    async fn select_user(&self, id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, email_verified, image
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn select_session(&self, session_token: &str) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, session_token, user_id, expires
            FROM sessions
            WHERE session_token = $1
            "#,
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn select_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> AuthResult<Option<VerificationToken>> {
        let row = sqlx::query_as::<_, VerificationTokenRow>(
            r#"
            SELECT identifier, token, expires
            FROM verification_tokens
            WHERE identifier = $1 AND token = $2
            "#,
        )
        .bind(identifier)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VerificationTokenRow::into_token))
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthAdapter {
    async fn create_user(&self, user: NewUser) -> AuthResult<User> {
        let id = UserId::new();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, email_verified, image)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&user.name)
        .bind(user.email.as_ref().map(Email::as_str))
        .bind(user.email_verified)
        .bind(&user.image)
        .execute(&self.pool)
        .await?;

        let created = self
            .select_user(id)
            .await?
            .ok_or_else(|| AuthError::inconsistency("created user could not be read back"))?;

        tracing::info!(user_id = %created.id, "User created");

        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> AuthResult<Option<User>> {
        self.select_user(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, email_verified, image
            FROM users
            WHERE lower(email) = $1
            LIMIT 2
            "#,
        )
        .bind(Email::normalize(email))
        .fetch_all(&self.pool)
        .await?;

        single_row(rows, "more than one user shares an email address")
            .map(|row| row.map(UserRow::into_user))
    }

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.name, u.email, u.email_verified, u.image
            FROM accounts a
            JOIN users u ON u.id = a.user_id
            WHERE a.provider = $1 AND a.provider_account_id = $2
            "#,
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn update_user(&self, patch: UserPatch) -> AuthResult<User> {
        let id = patch
            .id
            .ok_or_else(|| AuthError::inconsistency("update_user called without an id"))?;

        let updated = sqlx::query(
            r#"
            UPDATE users SET
                name = CASE WHEN $2 THEN $3 ELSE name END,
                email = CASE WHEN $4 THEN $5 ELSE email END,
                email_verified = CASE WHEN $6 THEN $7 ELSE email_verified END,
                image = CASE WHEN $8 THEN $9 ELSE image END
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.name.is_some())
        .bind(patch.name.clone().flatten())
        .bind(patch.email.is_some())
        .bind(patch.email.clone().flatten().map(|e| e.as_str().to_string()))
        .bind(patch.email_verified.is_some())
        .bind(patch.email_verified.flatten())
        .bind(patch.image.is_some())
        .bind(patch.image.clone().flatten())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AuthError::inconsistency(format!(
                "update_user matched no user with id {id}"
            )));
        }

        let user = self
            .select_user(id)
            .await?
            .ok_or_else(|| AuthError::inconsistency("updated user could not be read back"))?;

        tracing::info!(user_id = %user.id, "User updated");

        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> AuthResult<Option<User>> {
        let Some(user) = self.select_user(id).await? else {
            return Ok(None);
        };

        let deleted: Option<Uuid> = sqlx::query_scalar("DELETE FROM users WHERE id = $1 RETURNING id")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        if deleted.as_ref() != Some(id.as_uuid()) {
            return Err(AuthError::inconsistency(format!(
                "delete_user removed {deleted:?} instead of {id}"
            )));
        }

        tracing::info!(user_id = %id, "User deleted");

        Ok(Some(user))
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAuthAdapter {
    async fn link_account(&self, account: NewAccount) -> AuthResult<Account> {
        let id = AccountId::new();

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id,
                user_id,
                type,
                provider,
                provider_account_id,
                refresh_token,
                access_token,
                expires_at,
                token_type,
                scope,
                id_token,
                session_state
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(id.as_uuid())
        .bind(account.user_id.as_uuid())
        .bind(account.account_type.as_str())
        .bind(&account.provider)
        .bind(&account.provider_account_id)
        .bind(&account.refresh_token)
        .bind(&account.access_token)
        .bind(account.expires_at)
        .bind(&account.token_type)
        .bind(&account.scope)
        .bind(&account.id_token)
        .bind(&account.session_state)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                a.id,
                u.id AS user_id,
                a.type,
                a.provider,
                a.provider_account_id,
                a.refresh_token,
                a.access_token,
                a.expires_at,
                a.token_type,
                a.scope,
                a.id_token,
                a.session_state
            FROM accounts a
            JOIN users u ON u.id = a.user_id
            WHERE a.id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AuthError::inconsistency("linked account could not be read back"))?;

        let linked = row.into_account()?;

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
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            DELETE FROM accounts
            WHERE provider = $1 AND provider_account_id = $2
            RETURNING
                id,
                user_id,
                type,
                provider,
                provider_account_id,
                refresh_token,
                access_token,
                expires_at,
                token_type,
                scope,
                id_token,
                session_state
            "#,
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        // The row is already gone; the schema's CHECK keeps this from happening
        let account = row.into_account().inspect_err(|e| {
            tracing::error!(
                provider = %provider,
                provider_account_id = %provider_account_id,
                error = %e,
                "Unlinked account had an unreadable row"
            );
        })?;

        tracing::info!(
            user_id = %account.user_id,
            provider = %account.provider,
            "Account unlinked"
        );

        Ok(Some(account))
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthAdapter {
    async fn create_session(&self, session: NewSession) -> AuthResult<Session> {
        let id = SessionId::new();

        sqlx::query(
            r#"
            INSERT INTO sessions (id, session_token, user_id, expires)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&session.session_token)
        .bind(session.user_id.as_uuid())
        .bind(session.expires)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, session_token, user_id, expires
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AuthError::inconsistency("created session could not be read back"))?;

        let created = row.into_session();

        tracing::info!(user_id = %created.user_id, "Session created");

        Ok(created)
    }

    async fn get_session_and_user(
        &self,
        session_token: &str,
    ) -> AuthResult<Option<SessionAndUser>> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r#"
            SELECT
                s.id AS session_id,
                s.session_token,
                s.expires,
                u.id AS user_id,
                u.name,
                u.email,
                u.email_verified,
                u.image
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.session_token = $1
            "#,
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionUserRow::into_session_and_user))
    }

    async fn update_session(&self, patch: SessionPatch) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE sessions SET
                expires = COALESCE($2, expires),
                user_id = COALESCE($3, user_id)
            WHERE session_token = $1
            RETURNING id, session_token, user_id, expires
            "#,
        )
        .bind(&patch.session_token)
        .bind(patch.expires)
        .bind(patch.user_id.map(UserId::into_uuid))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn delete_session(&self, session_token: &str) -> AuthResult<Option<Session>> {
        let Some(session) = self.select_session(session_token).await? else {
            return Ok(None);
        };

        let deleted: Option<Uuid> =
            sqlx::query_scalar("DELETE FROM sessions WHERE session_token = $1 RETURNING id")
                .bind(session_token)
                .fetch_optional(&self.pool)
                .await?;

        if deleted.as_ref() != Some(session.id.as_uuid()) {
            return Err(AuthError::inconsistency(format!(
                "delete_session removed {deleted:?} instead of {}",
                session.id
            )));
        }

        tracing::info!(user_id = %session.user_id, "Session deleted");

        Ok(Some(session))
    }
}

// ============================================================================
// Verification Token Repository Implementation
// ============================================================================

impl VerificationTokenRepository for PgAuthAdapter {
    async fn create_verification_token(
        &self,
        token: VerificationToken,
    ) -> AuthResult<VerificationToken> {
        sqlx::query(
            r#"
            INSERT INTO verification_tokens (identifier, token, expires)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&token.identifier)
        .bind(&token.token)
        .bind(token.expires)
        .execute(&self.pool)
        .await?;

        self.select_verification_token(&token.identifier, &token.token)
            .await?
            .ok_or_else(|| {
                AuthError::inconsistency("created verification token could not be read back")
            })
    }

    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> AuthResult<Option<VerificationToken>> {
        self.select_verification_token(identifier, token).await
    }
}

/// At most one row, or the contract is broken
fn single_row<T>(mut rows: Vec<T>, violation: &str) -> AuthResult<Option<T>> {
    if rows.len() > 1 {
        return Err(AuthError::inconsistency(violation));
    }
    Ok(rows.pop())
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: Option<String>,
    email: Option<String>,
    email_verified: Option<DateTime<Utc>>,
    image: Option<String>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: UserId::from_uuid(self.id),
            name: self.name,
            email: self.email.map(Email::from_db),
            email_verified: self.email_verified,
            image: self.image,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    user_id: Uuid,
    #[sqlx(rename = "type")]
    account_type: String,
    provider: String,
    provider_account_id: String,
    refresh_token: Option<String>,
    access_token: Option<String>,
    expires_at: Option<i64>,
    token_type: Option<String>,
    scope: Option<String>,
    id_token: Option<String>,
    session_state: Option<String>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let account_type = self
            .account_type
            .parse::<AccountType>()
            .map_err(|e| AuthError::Internal(format!("Invalid account type: {}", e)))?;

        Ok(Account {
            id: AccountId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            account_type,
            provider: self.provider,
            provider_account_id: self.provider_account_id,
            refresh_token: self.refresh_token,
            access_token: self.access_token,
            expires_at: self.expires_at,
            token_type: self.token_type,
            scope: self.scope,
            id_token: self.id_token,
            session_state: self.session_state,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    session_token: String,
    user_id: Uuid,
    expires: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            id: SessionId::from_uuid(self.id),
            session_token: self.session_token,
            user_id: UserId::from_uuid(self.user_id),
            expires: self.expires,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionUserRow {
    session_id: Uuid,
    session_token: String,
    expires: DateTime<Utc>,
    user_id: Uuid,
    name: Option<String>,
    email: Option<String>,
    email_verified: Option<DateTime<Utc>>,
    image: Option<String>,
}

impl SessionUserRow {
    fn into_session_and_user(self) -> SessionAndUser {
        let user = UserRow {
            id: self.user_id,
            name: self.name,
            email: self.email,
            email_verified: self.email_verified,
            image: self.image,
        }
        .into_user();

        SessionAndUser {
            session: Session {
                id: SessionId::from_uuid(self.session_id),
                session_token: self.session_token,
                user_id: user.id,
                expires: self.expires,
            },
            user,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VerificationTokenRow {
    identifier: String,
    token: String,
    expires: DateTime<Utc>,
}

impl VerificationTokenRow {
    fn into_token(self) -> VerificationToken {
        VerificationToken::new(self.identifier, self.token, self.expires)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row_rejects_duplicates() {
        assert_eq!(single_row(Vec::<u8>::new(), "dup").unwrap(), None);
        assert_eq!(single_row(vec![1u8], "dup").unwrap(), Some(1));
        assert!(matches!(
            single_row(vec![1u8, 2], "dup"),
            Err(AuthError::AdapterInconsistency(_))
        ));
    }

    #[test]
    fn test_account_row_rejects_unknown_type() {
        let row = AccountRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            account_type: "saml".into(),
            provider: "discord".into(),
            provider_account_id: "1".into(),
            refresh_token: None,
            access_token: None,
            expires_at: None,
            token_type: None,
            scope: None,
            id_token: None,
            session_state: None,
        };
        assert!(matches!(row.into_account(), Err(AuthError::Internal(_))));
    }
}
