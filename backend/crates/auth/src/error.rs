//! Auth Error Types
//!
//! Adapter and sign-in flow errors. Not-found is never an error here: adapter
//! lookups return `Ok(None)`. Every variant maps onto the unified
//! `kernel::error::AppError` for HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A write appeared to succeed but the follow-up read or the delete
    /// identity check disagreed with it
    #[error("Adapter inconsistency: {0}")]
    AdapterInconsistency(String),

    /// Storage constraint violated (duplicate key, missing owning user)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller supplied a malformed value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No OAuth provider with this id is configured
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// OAuth `state` missing, forged or expired
    #[error("OAuth state mismatch")]
    OAuthStateMismatch,

    /// The identity provider rejected a request or returned garbage
    #[error("OAuth provider error: {0}")]
    OAuthProvider(String),

    /// The provider's email belongs to a user who never linked this provider
    #[error("Account is not linked to an existing user with the same email")]
    AccountNotLinked,

    /// Session cookie missing, unknown or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn inconsistency(message: impl Into<String>) -> Self {
        AuthError::AdapterInconsistency(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Conflict(_) => ErrorKind::Conflict,
            AuthError::InvalidInput(_) | AuthError::OAuthStateMismatch => ErrorKind::BadRequest,
            AuthError::UnknownProvider(_) => ErrorKind::NotFound,
            AuthError::OAuthProvider(_) => ErrorKind::BadGateway,
            AuthError::AccountNotLinked => ErrorKind::Forbidden,
            AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => {
                ErrorKind::ServiceUnavailable
            }
            AuthError::AdapterInconsistency(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Client-facing error; server-side details stay in the logs
    pub fn to_app_error(&self) -> AppError {
        match self.kind() {
            ErrorKind::InternalServerError => AppError::internal("Internal server error"),
            ErrorKind::ServiceUnavailable => AppError::service_unavailable("Database unavailable"),
            ErrorKind::Forbidden => AppError::forbidden(self.to_string())
                .with_action("Sign in with the provider you used originally"),
            kind => AppError::new(kind, self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::AdapterInconsistency(msg) => {
                tracing::error!(message = %msg, "Auth adapter inconsistency");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::OAuthProvider(msg) => {
                tracing::warn!(message = %msg, "OAuth provider failure");
            }
            AuthError::OAuthStateMismatch => {
                tracing::warn!("OAuth callback with mismatched state");
            }
            AuthError::AccountNotLinked => {
                tracing::warn!("Sign-in refused: email already used by another account");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                return AuthError::Conflict(db_err.message().to_string());
            }
        }
        AuthError::Database(err)
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.is_client_error() {
            AuthError::InvalidInput(err.message().to_string())
        } else {
            AuthError::Internal(err.to_string())
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::OAuthProvider(err.to_string())
    }
}
