//! Shared Kernel
//!
//! Vocabulary used by every crate in the workspace:
//! - the unified [`error::app_error::AppError`] and its [`error::kind::ErrorKind`]
//! - typed identifiers ([`id::Id`])
//!
//! Nothing domain-specific belongs here. If a type only makes sense for
//! email verification it lives in the `verification` crate instead.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
