//! Infrastructure Layer
//!
//! Repository and mailer implementations.

pub mod mailer;
pub mod memory;
pub mod postgres;
