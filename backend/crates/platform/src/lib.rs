//! Platform Crate - Technical Infrastructure
//!
//! Shared technical helpers with no domain knowledge:
//! - Cryptographic utilities (SHA-256, HMAC, Base64, OS-random digits)
//! - Session token extraction from request headers

pub mod crypto;
pub mod token;
