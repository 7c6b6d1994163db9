//! Infrastructure Layer
//!
//! Adapter implementations.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAuthAdapter;
pub use postgres::{ExpiredCleanup, PgAuthAdapter};
