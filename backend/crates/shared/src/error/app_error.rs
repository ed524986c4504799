//! Application Error
//!
//! [`AppError`] is the single error shape that crosses crate boundaries and
//! ends up in HTTP responses. Crate-local `thiserror` enums convert into it.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

/// Unified application error.
///
/// * `kind` - classification, drives the HTTP status
/// * `message` - safe to show to the end user
/// * `code` - machine-readable reason (e.g. `CODE_MISMATCH`)
/// * `action` - optional hint for what the user should do next
/// * `source` - underlying cause, for logs only
///
/// ```rust
/// use kernel::error::app_error::AppError;
/// use kernel::error::kind::ErrorKind;
///
/// let err = AppError::new(ErrorKind::Gone, "Verification code expired")
///     .with_code("EXPIRED")
///     .with_action("Request a new code");
/// assert_eq!(err.status_code(), 410);
/// ```
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    code: Option<Cow<'static, str>>,
    action: Option<Cow<'static, str>>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            action: None,
            source: None,
        }
    }

    #[inline]
    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[inline]
    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[inline]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    #[inline]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AppError");
        builder.field("kind", &self.kind);
        builder.field("message", &self.message);
        if let Some(code) = &self.code {
            builder.field("code", code);
        }
        if let Some(action) = &self.action {
            builder.field("action", action);
        }
        if let Some(source) = &self.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(action) = &self.action {
            write!(f, " (Action: {})", action)?;
        }
        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error() {
        let err = AppError::new(ErrorKind::Conflict, "Code does not match");
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), "Code does not match");
        assert!(err.code().is_none());
        assert!(err.action().is_none());
    }

    #[test]
    fn test_builders() {
        let err = AppError::new(ErrorKind::TooManyRequests, "Wait before resending")
            .with_code("RESEND_COOLDOWN")
            .with_action("Try again in 30 seconds");
        assert_eq!(err.code(), Some("RESEND_COOLDOWN"));
        assert_eq!(err.action(), Some("Try again in 30 seconds"));
        assert!(err.to_string().contains("Action:"));
    }

    #[test]
    fn test_with_source() {
        let io_err = std::io::Error::other("connection reset");
        let err = AppError::new(ErrorKind::InternalServerError, "Internal error").with_source(io_err);
        assert!(err.source().is_some());
        assert!(err.kind().is_server_error());
    }

    #[test]
    fn test_display() {
        let err = AppError::new(ErrorKind::Gone, "Verification code expired");
        assert_eq!(err.to_string(), "[Gone] Verification code expired");
    }
}
