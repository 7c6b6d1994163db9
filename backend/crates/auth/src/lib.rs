//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, adapter traits
//! - `application/` - Sign-in flow, session lookup, sign-out
//! - `infra/` - PostgreSQL and in-memory adapters
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - OAuth sign-in (Discord) with linked provider accounts
//! - Database sessions referenced by an opaque cookie token, with sliding expiry
//! - Email verification token storage
//!
//! ## Security Model
//! - OAuth `state` bound to the provider and HMAC-SHA256 signed in a short-lived cookie
//! - Session tokens carry 256 bits of entropy
//! - No implicit account linking: a provider profile whose email already
//!   belongs to another user is refused

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::oauth::OAuthProvider;
pub use domain::repository::AuthAdapter;
pub use error::{AuthError, AuthResult};
pub use infra::{ExpiredCleanup, MemoryAuthAdapter, PgAuthAdapter};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
