//! Entities persisted by the adapter

pub mod account;
pub mod session;
pub mod user;
pub mod verification_token;

pub use account::{Account, NewAccount};
pub use session::{NewSession, Session, SessionAndUser, SessionPatch};
pub use user::{NewUser, User, UserPatch};
pub use verification_token::VerificationToken;
