//! Value Object Module

pub mod account_type;
pub mod email;

pub use kernel::id::{AccountId, SessionId, UserId};
