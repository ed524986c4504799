//! Flow Error Types
//!
//! What the UI layer can see. Transport failures are folded into these
//! variants at the orchestrator boundary.

use thiserror::Error;

use crate::gateway::{GatewayError, RejectReason};

pub type FlowResult<T> = Result<T, FlowError>;

#[derive(Debug, Error)]
pub enum FlowError {
    /// The submitted code was not accepted; the flow continues
    #[error("{}", reject_message(.0))]
    Challenge(RejectReason),

    /// The code mail could not be sent; a resend may succeed
    #[error("Verification email could not be sent: {0}")]
    Delivery(String),

    /// No usable session; the flow has been left
    #[error("Could not load your account: {0}")]
    Identity(String),

    /// Network or server failure; nothing was retried
    #[error("Request failed: {0}")]
    Network(String),
}

impl FlowError {
    /// Errors after which the flow cannot continue
    pub fn is_fatal(&self) -> bool {
        matches!(self, FlowError::Identity(_))
    }
}

pub fn reject_message(reason: &RejectReason) -> &'static str {
    match reason {
        RejectReason::CodeMismatch => "Invalid code",
        RejectReason::NoActiveChallenge => "No active code. Please request a new one",
        RejectReason::Expired => "Code expired. Please request a new one",
    }
}

impl From<GatewayError> for FlowError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthenticated => FlowError::Identity(err.to_string()),
            other => FlowError::Network(other.to_string()),
        }
    }
}
