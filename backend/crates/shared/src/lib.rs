//! Shared Kernel
//!
//! Vocabulary shared by every crate in the workspace:
//! - the unified [`error::app_error::AppError`] and its [`error::kind::ErrorKind`]
//! - typed identifiers for persisted auth records ([`id::UserId`] and friends)
//!
//! Anything placed here must mean the same thing to the adapter, the HTTP
//! layer and the binary.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
