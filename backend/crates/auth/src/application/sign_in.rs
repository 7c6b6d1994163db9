//! Sign In Use Case
//!
//! OAuth authorization-code sign-in. `begin` issues a signed state and the
//! provider redirect; `complete` checks the state, talks to the provider and
//! turns the resulting profile into a user, a linked account and a session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::application::config::AuthConfig;
use crate::application::oauth::{OAuthProfile, OAuthProvider, TokenSet};
use crate::domain::entity::{NewSession, NewUser, Session, User};
use crate::domain::repository::AuthAdapter;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Entropy of session tokens and state nonces, in bytes
const TOKEN_BYTES: usize = 32;

/// Output of [`SignInUseCase::begin`]
#[derive(Debug)]
pub struct SignInStart {
    /// Where to send the browser
    pub redirect_url: Url,
    /// Value for the state cookie
    pub state_cookie: String,
}

/// Output of a completed sign-in
#[derive(Debug)]
pub struct SignInOutput {
    pub user: User,
    pub session: Session,
    pub is_new_user: bool,
}

/// Sign in use case
pub struct SignInUseCase<R>
where
    R: AuthAdapter,
{
    adapter: Arc<R>,
    config: Arc<AuthConfig>,
    http: reqwest::Client,
}

impl<R> SignInUseCase<R>
where
    R: AuthAdapter,
{
    pub fn new(adapter: Arc<R>, config: Arc<AuthConfig>, http: reqwest::Client) -> Self {
        Self {
            adapter,
            config,
            http,
        }
    }

    /// Start the flow: a fresh state plus the provider's authorization URL
    pub fn begin(&self, provider_id: &str) -> AuthResult<SignInStart> {
        let provider = self.provider(provider_id)?;
        let nonce = platform::crypto::random_token(TOKEN_BYTES);
        let state_cookie = sign_state(&self.config.state_secret, &provider.id, &nonce, Utc::now());
        let redirect_url =
            provider.authorization_url(&self.config.callback_url(&provider.id), &nonce)?;

        tracing::debug!(provider = %provider.id, "Sign-in started");

        Ok(SignInStart {
            redirect_url,
            state_cookie,
        })
    }

    /// Finish the flow from the provider's redirect back
    pub async fn complete(
        &self,
        provider_id: &str,
        code: &str,
        state: &str,
        state_cookie: Option<&str>,
    ) -> AuthResult<SignInOutput> {
        let provider = self.provider(provider_id)?;

        let state_cookie = state_cookie.ok_or(AuthError::OAuthStateMismatch)?;
        verify_state(
            &self.config.state_secret,
            &provider.id,
            state,
            state_cookie,
            self.config.state_ttl_chrono(),
            Utc::now(),
        )?;

        let callback_url = self.config.callback_url(&provider.id);
        let tokens = provider.exchange_code(&self.http, code, &callback_url).await?;
        let profile = provider.fetch_profile(&self.http, &tokens.access_token).await?;

        self.sign_in_with_profile(provider, &profile, &tokens).await
    }

    /// Resolve the profile to a user and open a session
    ///
    /// An account already linked signs its user in. Otherwise a new user is
    /// created, unless another user already owns the email: accounts are never
    /// linked implicitly by email.
    pub async fn sign_in_with_profile(
        &self,
        provider: &OAuthProvider,
        profile: &OAuthProfile,
        tokens: &TokenSet,
    ) -> AuthResult<SignInOutput> {
        let (user, is_new_user) = match self
            .adapter
            .get_user_by_account(&provider.id, &profile.id)
            .await?
        {
            Some(user) => (user, false),
            None => (self.register(provider, profile, tokens).await?, true),
        };

        let session = self
            .adapter
            .create_session(NewSession {
                session_token: platform::crypto::random_token(TOKEN_BYTES),
                user_id: user.id,
                expires: Utc::now() + self.config.session_max_age_chrono(),
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            provider = %provider.id,
            is_new_user,
            "User signed in"
        );

        Ok(SignInOutput {
            user,
            session,
            is_new_user,
        })
    }

    async fn register(
        &self,
        provider: &OAuthProvider,
        profile: &OAuthProfile,
        tokens: &TokenSet,
    ) -> AuthResult<User> {
        if let Some(email) = &profile.email {
            if self.adapter.get_user_by_email(email).await?.is_some() {
                return Err(AuthError::AccountNotLinked);
            }
        }

        let email = profile.email.as_deref().map(Email::new).transpose()?;
        let email_verified = (profile.email_verified && email.is_some()).then(Utc::now);

        let user = self
            .adapter
            .create_user(NewUser {
                name: profile.name.clone(),
                email,
                email_verified,
                image: profile.image.clone(),
            })
            .await?;

        // A user without its account would own the email and block every retry
        if let Err(link_err) = self
            .adapter
            .link_account(provider.new_account(user.id, &profile.id, tokens))
            .await
        {
            if let Err(cleanup_err) = self.adapter.delete_user(user.id).await {
                tracing::error!(
                    user_id = %user.id,
                    error = %cleanup_err,
                    "Failed to remove user after account link failure"
                );
            }
            return Err(link_err);
        }

        Ok(user)
    }

    fn provider(&self, provider_id: &str) -> AuthResult<&OAuthProvider> {
        self.config
            .provider(provider_id)
            .ok_or_else(|| AuthError::UnknownProvider(provider_id.to_string()))
    }
}

// ============================================================================
// OAuth state
// ============================================================================

/// Cookie value `{nonce}.{issued_at}.{tag}`, the tag covering the provider too
pub fn sign_state(
    secret: &[u8; 32],
    provider_id: &str,
    nonce: &str,
    issued_at: DateTime<Utc>,
) -> String {
    let issued_at = issued_at.timestamp();
    let tag = platform::crypto::hmac_sha256(
        secret,
        state_payload(provider_id, nonce, issued_at).as_bytes(),
    );
    format!(
        "{}.{}.{}",
        nonce,
        issued_at,
        platform::crypto::to_base64_url(&tag)
    )
}

/// Check the state cookie against the `state` the provider echoed back
pub fn verify_state(
    secret: &[u8; 32],
    provider_id: &str,
    state: &str,
    cookie: &str,
    ttl: chrono::Duration,
    now: DateTime<Utc>,
) -> AuthResult<()> {
    let mut parts = cookie.splitn(3, '.');
    let (Some(nonce), Some(issued_at), Some(tag)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::OAuthStateMismatch);
    };

    let issued_at: i64 = issued_at
        .parse()
        .map_err(|_| AuthError::OAuthStateMismatch)?;
    let tag = platform::crypto::from_base64_url(tag).map_err(|_| AuthError::OAuthStateMismatch)?;

    let payload = state_payload(provider_id, nonce, issued_at);
    if !platform::crypto::verify_hmac_sha256(secret, payload.as_bytes(), &tag) {
        return Err(AuthError::OAuthStateMismatch);
    }

    if !platform::crypto::constant_time_eq(nonce.as_bytes(), state.as_bytes()) {
        return Err(AuthError::OAuthStateMismatch);
    }

    if now.timestamp() - issued_at > ttl.num_seconds() {
        return Err(AuthError::OAuthStateMismatch);
    }

    Ok(())
}

fn state_payload(provider_id: &str, nonce: &str, issued_at: i64) -> String {
    format!("{provider_id}:{nonce}:{issued_at}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 32] = [3u8; 32];

    fn ttl() -> chrono::Duration {
        chrono::Duration::minutes(15)
    }

    #[test]
    fn test_state_roundtrip() {
        let now = Utc::now();
        let cookie = sign_state(&SECRET, "discord", "nonce-1", now);
        assert!(verify_state(&SECRET, "discord", "nonce-1", &cookie, ttl(), now).is_ok());
    }

    #[test]
    fn test_state_rejects_other_nonce() {
        let now = Utc::now();
        let cookie = sign_state(&SECRET, "discord", "nonce-1", now);
        assert!(matches!(
            verify_state(&SECRET, "discord", "nonce-2", &cookie, ttl(), now),
            Err(AuthError::OAuthStateMismatch)
        ));
    }

    #[test]
    fn test_state_rejects_other_provider_and_secret() {
        let now = Utc::now();
        let cookie = sign_state(&SECRET, "discord", "n", now);
        assert!(verify_state(&SECRET, "github", "n", &cookie, ttl(), now).is_err());
        assert!(verify_state(&[4u8; 32], "discord", "n", &cookie, ttl(), now).is_err());
    }

    #[test]
    fn test_state_expires() {
        let issued = Utc::now();
        let cookie = sign_state(&SECRET, "discord", "n", issued);
        let later = issued + ttl() + chrono::Duration::seconds(1);
        assert!(verify_state(&SECRET, "discord", "n", &cookie, ttl(), later).is_err());
    }

    #[test]
    fn test_state_rejects_garbage() {
        let now = Utc::now();
        for cookie in ["", "a.b", "n.notanumber.tag", "n.1.!!!"] {
            assert!(verify_state(&SECRET, "discord", "n", cookie, ttl(), now).is_err());
        }
    }
}
