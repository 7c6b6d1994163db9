//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};

use crate::application::config::AuthConfig;
use crate::domain::repository::AuthAdapter;
use crate::infra::postgres::PgAuthAdapter;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the Auth router with the PostgreSQL adapter
pub fn auth_router(adapter: PgAuthAdapter, config: AuthConfig) -> Router {
    auth_router_with_state(AuthAppState::new(adapter, config))
}

/// Create a generic Auth router for any adapter implementation
pub fn auth_router_generic<R>(adapter: R, config: AuthConfig) -> Router
where
    R: AuthAdapter,
{
    auth_router_with_state(AuthAppState::new(adapter, config))
}

/// Router over existing state, so the same state can back [`require_session`](crate::presentation::middleware::require_session)
pub fn auth_router_with_state<R>(state: AuthAppState<R>) -> Router
where
    R: AuthAdapter,
{
    Router::new()
        .route("/providers", get(handlers::providers::<R>))
        .route("/signin/{provider}", get(handlers::sign_in::<R>))
        .route("/callback/{provider}", get(handlers::callback::<R>))
        .route("/session", get(handlers::session::<R>))
        .route("/signout", post(handlers::sign_out::<R>))
        .with_state(state)
}
