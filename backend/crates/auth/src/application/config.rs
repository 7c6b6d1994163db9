//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

use crate::application::oauth::OAuthProvider;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Public base URL the browser reaches this service on, without trailing slash
    pub base_url: String,
    /// Path the auth router is mounted under
    pub base_path: String,
    /// Where the browser lands after a successful sign-in
    pub sign_in_redirect: String,
    /// Session cookie name
    pub session_cookie_name: String,
    /// OAuth state cookie name
    pub state_cookie_name: String,
    /// Key for signing the OAuth `state` value (32 bytes)
    pub state_secret: [u8; 32],
    /// Session lifetime (30 days)
    pub session_max_age: Duration,
    /// How often a session's expiry is pushed forward (24 hours)
    pub session_update_age: Duration,
    /// How long a sign-in attempt may take (15 minutes)
    pub state_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Configured identity providers
    pub providers: Vec<OAuthProvider>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            base_path: "/api/auth".to_string(),
            sign_in_redirect: "/".to_string(),
            session_cookie_name: "auth.session-token".to_string(),
            state_cookie_name: "auth.state".to_string(),
            state_secret: [0u8; 32],
            session_max_age: Duration::from_secs(30 * 24 * 3600), // 30 days
            session_update_age: Duration::from_secs(24 * 3600),   // 24 hours
            state_ttl: Duration::from_secs(15 * 60),              // 15 minutes
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            providers: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Create config with a random state secret (for development)
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&platform::crypto::random_bytes(32));
        Self {
            state_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    pub fn with_provider(mut self, provider: OAuthProvider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider(&self, id: &str) -> Option<&OAuthProvider> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Absolute URL of an auth route, e.g. `callback/discord`
    pub fn auth_url(&self, route: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            self.base_path.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    pub fn callback_url(&self, provider_id: &str) -> String {
        self.auth_url(&format!("callback/{provider_id}"))
    }

    pub fn session_max_age_chrono(&self) -> chrono::Duration {
        to_chrono(self.session_max_age)
    }

    pub fn session_update_age_chrono(&self) -> chrono::Duration {
        to_chrono(self.session_update_age)
    }

    pub fn state_ttl_chrono(&self) -> chrono::Duration {
        to_chrono(self.state_ttl)
    }

    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig::new(&self.session_cookie_name)
            .with_secure(self.cookie_secure)
            .with_same_site(self.cookie_same_site)
            .with_max_age(self.session_max_age.as_secs() as i64)
    }

    /// The state cookie is read on the provider's redirect back, so it must
    /// survive a cross-site top-level navigation.
    pub fn state_cookie(&self) -> CookieConfig {
        CookieConfig::new(&self.state_cookie_name)
            .with_secure(self.cookie_secure)
            .with_same_site(SameSite::Lax)
            .with_max_age(self.state_ttl.as_secs() as i64)
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.session_max_age_chrono(), chrono::Duration::days(30));
        assert_eq!(config.session_update_age_chrono(), chrono::Duration::hours(24));
        assert_eq!(config.state_ttl_chrono(), chrono::Duration::minutes(15));
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_development_has_random_secret() {
        let a = AuthConfig::development();
        let b = AuthConfig::development();
        assert!(!a.cookie_secure);
        assert_ne!(a.state_secret, [0u8; 32]);
        assert_ne!(a.state_secret, b.state_secret);
    }

    #[test]
    fn test_callback_url() {
        let config = AuthConfig {
            base_url: "https://app.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.callback_url("discord"),
            "https://app.example.com/api/auth/callback/discord"
        );
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = AuthConfig::development()
            .session_cookie()
            .build_set_cookie("tok");
        assert!(cookie.starts_with("auth.session-token=tok"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(!cookie.contains("Secure"));
    }
}
