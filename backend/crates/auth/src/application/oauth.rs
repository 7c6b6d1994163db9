//! OAuth Providers
//!
//! Authorization-code flow against a configured identity provider: build the
//! authorization URL, exchange the code, fetch and normalize the profile.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;

use crate::domain::entity::NewAccount;
use crate::domain::value_object::{UserId, account_type::AccountType};
use crate::error::{AuthError, AuthResult};

const DISCORD_CDN: &str = "https://cdn.discordapp.com";

/// How a provider's userinfo JSON maps onto [`OAuthProfile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileShape {
    Discord,
}

#[derive(Debug, Clone)]
pub struct OAuthProvider {
    /// Route segment and `accounts.provider` value, e.g. `discord`
    pub id: String,
    /// Display name
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub scopes: Vec<String>,
    pub profile_shape: ProfileShape,
}

/// Tokens returned by the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: Option<String>,
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

impl TokenSet {
    /// Absolute expiry in unix seconds; `None` if unknown or out of range
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_in
            .and_then(|secs| now.timestamp().checked_add(secs))
    }
}

/// Normalized user profile from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    /// The user's id at the provider
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    global_name: Option<String>,
    discriminator: Option<String>,
    avatar: Option<String>,
    email: Option<String>,
    verified: Option<bool>,
}

impl OAuthProvider {
    pub fn discord(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            id: "discord".to_string(),
            name: "Discord".to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_endpoint: "https://discord.com/api/oauth2/authorize".to_string(),
            token_endpoint: "https://discord.com/api/oauth2/token".to_string(),
            userinfo_endpoint: "https://discord.com/api/users/@me".to_string(),
            scopes: vec!["identify".to_string(), "email".to_string()],
            profile_shape: ProfileShape::Discord,
        }
    }

    pub fn authorization_url(&self, callback_url: &str, state: &str) -> AuthResult<Url> {
        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            &self.authorization_endpoint,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", callback_url),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Internal(format!("Invalid authorization endpoint: {}", e)))
    }

    pub async fn exchange_code(
        &self,
        http: &reqwest::Client,
        code: &str,
        callback_url: &str,
    ) -> AuthResult<TokenSet> {
        let response = http
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", callback_url),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::OAuthProvider(format!(
                "{} token endpoint returned {}",
                self.id,
                response.status()
            )));
        }

        Ok(response.json::<TokenSet>().await?)
    }

    pub async fn fetch_profile(
        &self,
        http: &reqwest::Client,
        access_token: &str,
    ) -> AuthResult<OAuthProfile> {
        let response = http
            .get(&self.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::OAuthProvider(format!(
                "{} userinfo endpoint returned {}",
                self.id,
                response.status()
            )));
        }

        let body = response.json::<serde_json::Value>().await?;
        self.parse_profile(body)
    }

    pub fn parse_profile(&self, body: serde_json::Value) -> AuthResult<OAuthProfile> {
        match self.profile_shape {
            ProfileShape::Discord => {
                let user: DiscordUser = serde_json::from_value(body).map_err(|e| {
                    AuthError::OAuthProvider(format!("Unexpected Discord profile: {}", e))
                })?;
                Ok(user.into_profile())
            }
        }
    }

    /// Account row for a completed sign-in
    pub fn new_account(&self, user_id: UserId, profile_id: &str, tokens: &TokenSet) -> NewAccount {
        NewAccount {
            refresh_token: tokens.refresh_token.clone(),
            access_token: Some(tokens.access_token.clone()),
            expires_at: tokens.expires_at(Utc::now()),
            token_type: tokens.token_type.clone(),
            scope: tokens.scope.clone(),
            id_token: tokens.id_token.clone(),
            ..NewAccount::new(user_id, AccountType::OAuth, &self.id, profile_id)
        }
    }
}

impl DiscordUser {
    fn into_profile(self) -> OAuthProfile {
        let image = discord_avatar_url(&self.id, self.avatar.as_deref(), self.discriminator.as_deref());
        let name = self
            .global_name
            .filter(|n| !n.is_empty())
            .unwrap_or(self.username);

        OAuthProfile {
            id: self.id,
            name: Some(name),
            email: self.email,
            email_verified: self.verified.unwrap_or(false),
            image: Some(image),
        }
    }
}

/// CDN URL for a Discord avatar hash, or the default avatar when unset
pub fn discord_avatar_url(user_id: &str, avatar: Option<&str>, discriminator: Option<&str>) -> String {
    match avatar {
        Some(hash) if !hash.is_empty() => {
            let format = if hash.starts_with("a_") { "gif" } else { "png" };
            format!("{DISCORD_CDN}/avatars/{user_id}/{hash}.{format}")
        }
        _ => {
            // Pomelo usernames have discriminator "0"
            let index = match discriminator.unwrap_or("0") {
                "0" => (user_id.parse::<u64>().unwrap_or(0) >> 22) % 6,
                disc => disc.parse::<u64>().unwrap_or(0) % 5,
            };
            format!("{DISCORD_CDN}/embed/avatars/{index}.png")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discord() -> OAuthProvider {
        OAuthProvider::discord("client-1", "secret-1")
    }

    #[test]
    fn test_authorization_url_params() {
        let url = discord()
            .authorization_url("http://localhost:3000/api/auth/callback/discord", "st ate")
            .unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("discord.com"));
        assert_eq!(params["client_id"], "client-1");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], "identify email");
        assert_eq!(params["state"], "st ate");
        assert_eq!(
            params["redirect_uri"],
            "http://localhost:3000/api/auth/callback/discord"
        );
    }

    #[test]
    fn test_discord_profile_prefers_global_name() {
        let profile = discord()
            .parse_profile(serde_json::json!({
                "id": "80351110224678912",
                "username": "nelly",
                "global_name": "Nelly",
                "discriminator": "0",
                "avatar": "8342729096ea3675442027381ff50dfe",
                "email": "nelly@discord.com",
                "verified": true
            }))
            .unwrap();

        assert_eq!(profile.id, "80351110224678912");
        assert_eq!(profile.name.as_deref(), Some("Nelly"));
        assert_eq!(profile.email.as_deref(), Some("nelly@discord.com"));
        assert!(profile.email_verified);
        assert_eq!(
            profile.image.as_deref(),
            Some(
                "https://cdn.discordapp.com/avatars/80351110224678912/8342729096ea3675442027381ff50dfe.png"
            )
        );
    }

    #[test]
    fn test_discord_profile_falls_back_to_username() {
        let profile = discord()
            .parse_profile(serde_json::json!({
                "id": "1",
                "username": "nelly",
                "global_name": null,
                "avatar": null
            }))
            .unwrap();
        assert_eq!(profile.name.as_deref(), Some("nelly"));
        assert!(profile.email.is_none());
        assert!(!profile.email_verified);
    }

    #[test]
    fn test_discord_profile_missing_id_is_provider_error() {
        let err = discord()
            .parse_profile(serde_json::json!({ "username": "x" }))
            .unwrap_err();
        assert!(matches!(err, AuthError::OAuthProvider(_)));
    }

    #[test]
    fn test_discord_avatar_url() {
        assert_eq!(
            discord_avatar_url("123456", Some("a_abc"), Some("1234")),
            "https://cdn.discordapp.com/avatars/123456/a_abc.gif"
        );
        assert_eq!(
            discord_avatar_url("123456", None, Some("1234")),
            "https://cdn.discordapp.com/embed/avatars/4.png"
        );
        // (80351110224678912 >> 22) % 6 == 5
        assert_eq!(
            discord_avatar_url("80351110224678912", None, Some("0")),
            "https://cdn.discordapp.com/embed/avatars/5.png"
        );
    }

    #[test]
    fn test_expires_at_out_of_range_is_unknown() {
        let now = Utc::now();
        let mut tokens = TokenSet {
            access_token: "at".into(),
            token_type: None,
            refresh_token: None,
            expires_in: Some(i64::MAX),
            scope: None,
            id_token: None,
        };
        assert_eq!(tokens.expires_at(now), None);

        tokens.expires_in = Some(3600);
        assert_eq!(tokens.expires_at(now), Some(now.timestamp() + 3600));

        tokens.expires_in = None;
        assert_eq!(tokens.expires_at(now), None);
    }

    #[test]
    fn test_new_account_carries_tokens() {
        let tokens = TokenSet {
            access_token: "at".into(),
            token_type: Some("Bearer".into()),
            refresh_token: Some("rt".into()),
            expires_in: Some(604800),
            scope: Some("identify email".into()),
            id_token: None,
        };
        let user_id = UserId::new();
        let account = discord().new_account(user_id, "42", &tokens);

        assert_eq!(account.user_id, user_id);
        assert_eq!(account.provider, "discord");
        assert_eq!(account.provider_account_id, "42");
        assert_eq!(account.account_type, AccountType::OAuth);
        assert_eq!(account.access_token.as_deref(), Some("at"));
        assert!(account.expires_at.unwrap() > Utc::now().timestamp());
        assert!(account.id_token.is_none());
    }
}
