//! Auth Middleware
//!
//! Middleware for requiring a signed-in user on protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::application::SessionUseCase;
use crate::domain::repository::AuthAdapter;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Middleware that requires a live session
///
/// On success the [`SessionUser`](crate::application::SessionUser) is stored in
/// request extensions for downstream handlers (`Extension<SessionUser>`).
///
/// ```ignore
/// let protected = Router::new()
///     .route("/me", get(me))
///     .route_layer(axum::middleware::from_fn_with_state(state, require_session::<R>));
/// ```
pub async fn require_session<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthAdapter,
{
    let token = state
        .session_token(req.headers())
        .ok_or(AuthError::SessionInvalid)?;

    let use_case = SessionUseCase::new(state.adapter.clone(), state.config.clone());
    let session = use_case
        .execute(&token)
        .await?
        .ok_or(AuthError::SessionInvalid)?;

    req.extensions_mut().insert(session.user);

    Ok(next.run(req).await)
}
