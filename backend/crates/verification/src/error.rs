//! Verification Error Types
//!
//! Verification-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::entities::RejectReason;

pub type VerificationResult<T> = Result<T, VerificationError>;

#[derive(Debug, Error)]
pub enum VerificationError {
    /// Empty or malformed email address
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Missing, unknown or expired session token
    #[error("Not authenticated")]
    Unauthenticated,

    /// Email already verified, no challenge needed
    #[error("Email already verified")]
    AlreadyVerified,

    /// A challenge was issued too recently
    #[error("Resend available in {retry_after_secs}s")]
    ResendCooldown { retry_after_secs: u64 },

    /// Submitted code did not verify
    #[error("{0}")]
    Rejected(RejectReason),

    /// Mark-verified requested without a verified challenge
    #[error("Email has not been verified")]
    NotVerified,

    /// Account referenced by a session no longer exists
    #[error("Account not found")]
    AccountNotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VerificationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VerificationError::InvalidEmail(_) => ErrorKind::BadRequest,
            VerificationError::Unauthenticated => ErrorKind::Unauthorized,
            VerificationError::AlreadyVerified => ErrorKind::Conflict,
            VerificationError::ResendCooldown { .. } => ErrorKind::TooManyRequests,
            VerificationError::Rejected(reason) => match reason {
                RejectReason::CodeMismatch => ErrorKind::Conflict,
                RejectReason::NoActiveChallenge => ErrorKind::NotFound,
                RejectReason::Expired => ErrorKind::Gone,
            },
            VerificationError::NotVerified => ErrorKind::Forbidden,
            VerificationError::AccountNotFound => ErrorKind::NotFound,
            VerificationError::Database(_) | VerificationError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Machine-readable reason carried in the problem body
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::InvalidEmail(_) => "INVALID_EMAIL",
            VerificationError::Unauthenticated => "UNAUTHENTICATED",
            VerificationError::AlreadyVerified => "ALREADY_VERIFIED",
            VerificationError::ResendCooldown { .. } => "RESEND_COOLDOWN",
            VerificationError::Rejected(reason) => reason.code(),
            VerificationError::NotVerified => "NOT_VERIFIED",
            VerificationError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            VerificationError::Database(_) | VerificationError::Internal(_) => "INTERNAL",
        }
    }

    /// Problem shape for clients. Database and internal details never reach
    /// the message; database errors are kept as the source.
    pub fn into_app_error(self) -> AppError {
        let kind = self.kind();
        let code = self.code();
        let action = matches!(
            self,
            VerificationError::Rejected(RejectReason::Expired | RejectReason::NoActiveChallenge)
        );

        let err = match self {
            VerificationError::Database(e) => AppError::new(kind, "Internal error").with_source(e),
            VerificationError::Internal(_) => AppError::new(kind, "Internal error"),
            other => AppError::new(kind, other.to_string()),
        }
        .with_code(code);

        if action {
            err.with_action("Request a new code")
        } else {
            err
        }
    }

    fn log(&self) {
        if self.kind().is_server_error() {
            tracing::error!(error = %self, "Verification request failed");
            return;
        }

        match self {
            VerificationError::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Verification code rejected");
            }
            VerificationError::ResendCooldown { retry_after_secs } => {
                tracing::info!(retry_after_secs, "Challenge requested during cooldown");
            }
            _ => {
                tracing::debug!(error = %self, "Verification error");
            }
        }
    }
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        err.into_app_error()
    }
}

impl IntoResponse for VerificationError {
    fn into_response(self) -> Response {
        self.log();
        let retry_after = match self {
            VerificationError::ResendCooldown { retry_after_secs } => Some(retry_after_secs),
            _ => None,
        };

        let mut response = self.into_app_error().into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
