//! HTTP Handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};

use crate::application::config::AuthConfig;
use crate::application::{SessionUseCase, SignInUseCase, SignOutUseCase};
use crate::domain::repository::AuthAdapter;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{CallbackQuery, ProviderResponse, SessionResponse};

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AuthAdapter,
{
    pub adapter: Arc<R>,
    pub config: Arc<AuthConfig>,
    /// Client for calls to identity providers
    pub http: reqwest::Client,
}

impl<R> AuthAppState<R>
where
    R: AuthAdapter,
{
    pub fn new(adapter: R, config: AuthConfig) -> Self {
        Self {
            adapter: Arc::new(adapter),
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }

    pub(crate) fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        platform::cookie::extract_cookie(headers, &self.config.session_cookie_name)
    }
}

// ============================================================================
// Providers
// ============================================================================

/// GET /api/auth/providers
pub async fn providers<R>(
    State(state): State<AuthAppState<R>>,
) -> Json<BTreeMap<String, ProviderResponse>>
where
    R: AuthAdapter,
{
    Json(
        state
            .config
            .providers
            .iter()
            .map(|p| (p.id.clone(), ProviderResponse::new(p, &state.config)))
            .collect(),
    )
}

// ============================================================================
// Sign In
// ============================================================================

/// GET /api/auth/signin/{provider}
pub async fn sign_in<R>(
    State(state): State<AuthAppState<R>>,
    Path(provider): Path<String>,
) -> AuthResult<Response>
where
    R: AuthAdapter,
{
    let use_case = SignInUseCase::new(
        state.adapter.clone(),
        state.config.clone(),
        state.http.clone(),
    );

    let start = use_case.begin(&provider)?;
    let cookie = state.config.state_cookie().build_set_cookie(&start.state_cookie);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to(start.redirect_url.as_str()),
    )
        .into_response())
}

/// GET /api/auth/callback/{provider}
pub async fn callback<R>(
    State(state): State<AuthAppState<R>>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: AuthAdapter,
{
    if let Some(error) = query.error {
        return Err(AuthError::OAuthProvider(format!(
            "{provider} returned error: {error}"
        )));
    }

    let code = query
        .code
        .ok_or_else(|| AuthError::InvalidInput("Missing authorization code".to_string()))?;
    let oauth_state = query.state.ok_or(AuthError::OAuthStateMismatch)?;
    let state_cookie = platform::cookie::extract_cookie(&headers, &state.config.state_cookie_name);

    let use_case = SignInUseCase::new(
        state.adapter.clone(),
        state.config.clone(),
        state.http.clone(),
    );

    let output = use_case
        .complete(&provider, &code, &oauth_state, state_cookie.as_deref())
        .await?;

    let session_cookie = state
        .config
        .session_cookie()
        .build_set_cookie(&output.session.session_token);
    let clear_state = state.config.state_cookie().build_delete_cookie();

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, session_cookie),
            (header::SET_COOKIE, clear_state),
        ]),
        Redirect::to(&state.config.sign_in_redirect),
    )
        .into_response())
}

// ============================================================================
// Session
// ============================================================================

/// GET /api/auth/session
pub async fn session<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: AuthAdapter,
{
    let Some(token) = state.session_token(&headers) else {
        return Ok(Json(SessionResponse::default()).into_response());
    };

    let use_case = SessionUseCase::new(state.adapter.clone(), state.config.clone());
    let cookie = state.config.session_cookie();

    match use_case.execute(&token).await? {
        Some(active) if active.refreshed => Ok((
            AppendHeaders([(header::SET_COOKIE, cookie.build_set_cookie(&token))]),
            Json(SessionResponse::from(active)),
        )
            .into_response()),
        Some(active) => Ok(Json(SessionResponse::from(active)).into_response()),
        None => Ok((
            AppendHeaders([(header::SET_COOKIE, cookie.build_delete_cookie())]),
            Json(SessionResponse::default()),
        )
            .into_response()),
    }
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: AuthAdapter,
{
    if let Some(token) = state.session_token(&headers) {
        let use_case = SignOutUseCase::new(state.adapter.clone());
        // The cookie is cleared regardless
        if let Err(e) = use_case.execute(&token).await {
            tracing::warn!(error = %e, "Failed to delete session on sign-out");
        }
    }

    let cookie = state.config.session_cookie().build_delete_cookie();

    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}
