//! Email Verification Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Challenge state machine, value objects, ports (repositories, mailer, code generator)
//! - `application/` - Use cases
//! - `infra/` - Postgres / in-memory stores, SMTP and logging mailers
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Security Model
//! - The server is the only party that knows an issued code; clients submit candidates
//! - Codes are stored as HMAC-SHA256 digests and compared in constant time
//! - One active challenge per email; issuing a new one supersedes the old code
//! - Codes expire independently of the resend cooldown
//! - Repeated wrong guesses invalidate the challenge

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

pub use application::config::VerificationConfig;
pub use domain::services::{CodeGenerator, OsRngCodeGenerator};
pub use error::{VerificationError, VerificationResult};
pub use infra::memory::InMemoryVerificationRepository;
pub use infra::postgres::PgVerificationRepository;
pub use presentation::handlers::VerificationStore;
pub use presentation::router::{verification_router, verification_router_generic};

pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}

pub mod mail {
    pub use crate::domain::services::{DeliveryError, Mailer, OutgoingMail, VerificationMail};
    pub use crate::infra::mailer::{LogMailer, SmtpConfig, SmtpMailer};
}
