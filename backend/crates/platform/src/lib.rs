//! Platform Crate - Technical Infrastructure
//!
//! Shared technical building blocks with no auth vocabulary of their own:
//! - Cryptographic utilities (random tokens, HMAC-SHA256, URL-safe Base64)
//! - Cookie parsing and `Set-Cookie` construction

pub mod cookie;
pub mod crypto;
