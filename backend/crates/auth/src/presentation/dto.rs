//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::application::oauth::OAuthProvider;
use crate::application::session::{ActiveSession, SessionUser};

// ============================================================================
// Providers
// ============================================================================

/// One entry of `GET /providers`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub signin_url: String,
    pub callback_url: String,
}

impl ProviderResponse {
    pub fn new(provider: &OAuthProvider, config: &AuthConfig) -> Self {
        Self {
            id: provider.id.clone(),
            name: provider.name.clone(),
            kind: "oauth",
            signin_url: config.auth_url(&format!("signin/{}", provider.id)),
            callback_url: config.callback_url(&provider.id),
        }
    }
}

// ============================================================================
// OAuth Callback
// ============================================================================

/// Query string the provider redirects back with
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set when the user denied access or the provider failed
    pub error: Option<String>,
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SessionUserResponse {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl From<SessionUser> for SessionUserResponse {
    fn from(user: SessionUser) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            image: user.image,
        }
    }
}

/// `GET /session` body; serializes to `{}` when signed out
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl From<ActiveSession> for SessionResponse {
    fn from(session: ActiveSession) -> Self {
        Self {
            user: Some(session.user.into()),
            expires: Some(session.expires),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::UserId;

    #[test]
    fn test_empty_session_serializes_to_empty_object() {
        let json = serde_json::to_value(SessionResponse::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_session_carries_user_id() {
        let id = UserId::new();
        let json = serde_json::to_value(SessionResponse::from(ActiveSession {
            user: SessionUser {
                id,
                name: Some("Ada".into()),
                email: None,
                image: None,
            },
            expires: Utc::now(),
            refreshed: false,
        }))
        .unwrap();

        assert_eq!(json["user"]["id"], id.to_string());
        assert_eq!(json["user"]["name"], "Ada");
        assert!(json["user"]["email"].is_null());
        assert!(json["expires"].is_string());
    }

    #[test]
    fn test_provider_response_shape() {
        let config = AuthConfig::default();
        let json = serde_json::to_value(ProviderResponse::new(
            &OAuthProvider::discord("id", "secret"),
            &config,
        ))
        .unwrap();

        assert_eq!(json["type"], "oauth");
        assert_eq!(
            json["signinUrl"],
            "http://localhost:3000/api/auth/signin/discord"
        );
        assert_eq!(
            json["callbackUrl"],
            "http://localhost:3000/api/auth/callback/discord"
        );
    }
}
