//! Domain Layer
//!
//! Entities, value objects and the adapter traits.

pub mod entity;
pub mod repository;
pub mod value_object;

pub use repository::{
    AccountRepository, AuthAdapter, SessionRepository, UserRepository,
    VerificationTokenRepository,
};
