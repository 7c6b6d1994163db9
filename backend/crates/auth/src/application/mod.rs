//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod oauth;
pub mod session;
pub mod sign_in;
pub mod sign_out;

// Re-exports
pub use config::AuthConfig;
pub use oauth::{OAuthProfile, OAuthProvider, TokenSet};
pub use session::{ActiveSession, SessionUseCase, SessionUser};
pub use sign_in::{SignInOutput, SignInStart, SignInUseCase};
pub use sign_out::SignOutUseCase;
