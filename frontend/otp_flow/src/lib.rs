//! Email Verification Client Flow
//!
//! - `input` - segmented OTP entry (typing, backspace, paste)
//! - `gateway` - the verification API as seen by the client
//! - `countdown` - one-second resend countdown
//! - `orchestrator` - drives identity check, challenge, resend and submit
//!
//! The client never knows the issued code: it submits a candidate and
//! the server answers accepted or rejected.

pub mod countdown;
pub mod error;
pub mod gateway;
pub mod input;
pub mod orchestrator;

pub use countdown::Countdown;
pub use error::{FlowError, FlowResult};
pub use gateway::{
    GatewayError, HttpVerificationGateway, Identity, IssuedChallenge, RejectReason,
    VerificationGateway, VerifyResult,
};
pub use input::{InputEvent, InputOutcome, OtpInputController};
pub use orchestrator::{Exit, Notice, NoticeLevel, Phase, VerificationOrchestrator};

#[cfg(test)]
mod tests;
