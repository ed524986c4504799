//! Verification Orchestrator
//!
//! Drives one verification flow for one signed-in user:
//!
//! ```text
//! Idle --start--> AwaitingCode --code accepted + marked--> Verified
//!   |                  |
//!   |                  \--session lost--> Redirected(SignIn)
//!   \--no session--> Redirected(SignIn)
//!   \--already verified--> Redirected(AlreadyVerified)
//! ```
//!
//! Each orchestrator owns its own state, so two flows (e.g. two tabs) never
//! share a challenge client-side; the server keeps one challenge per email
//! and the latest issue wins.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::countdown::Countdown;
use crate::error::{FlowError, FlowResult, reject_message};
use crate::gateway::{GatewayError, Identity, IssuedChallenge, VerificationGateway, VerifyResult};
use crate::input::{InputEvent, InputOutcome, OtpInputController};

/// Where the user is sent when leaving the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    SignIn,
    AlreadyVerified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingCode,
    Verified,
    Redirected(Exit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub struct VerificationOrchestrator<G>
where
    G: VerificationGateway,
{
    gateway: G,
    session_token: String,
    identity: Option<Identity>,
    input: OtpInputController,
    phase: Phase,
    /// One-shot: the initial challenge is requested at most once
    challenge_requested: bool,
    /// Set once the server accepted a code; marking verified may still be pending
    code_accepted: bool,
    resend_available_at: Option<Instant>,
    countdown: Option<Countdown>,
    notices: Vec<Notice>,
}

impl<G> VerificationOrchestrator<G>
where
    G: VerificationGateway,
{
    pub fn new(gateway: G, session_token: impl Into<String>) -> Self {
        Self {
            gateway,
            session_token: session_token.into(),
            identity: None,
            input: OtpInputController::default(),
            phase: Phase::Idle,
            challenge_requested: false,
            code_accepted: false,
            resend_available_at: None,
            countdown: None,
            notices: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn input(&self) -> &OtpInputController {
        &self.input
    }

    /// Drain pending notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Seconds shown on the resend countdown
    pub fn countdown_secs(&self) -> u64 {
        self.countdown.as_ref().map_or(0, Countdown::remaining)
    }

    pub fn subscribe_countdown(&self) -> Option<watch::Receiver<u64>> {
        self.countdown.as_ref().map(Countdown::subscribe)
    }

    pub fn can_resend(&self) -> bool {
        self.phase == Phase::AwaitingCode
            && self
                .resend_available_at
                .is_none_or(|at| Instant::now() >= at)
    }

    /// Whole seconds until a resend is allowed, rounded up
    pub fn seconds_until_resend(&self) -> u64 {
        let Some(at) = self.resend_available_at else {
            return 0;
        };
        let remaining = at.saturating_duration_since(Instant::now());
        remaining.as_millis().div_ceil(1000) as u64
    }

    /// Load the identity and, if verification is needed, request the first code.
    pub async fn start(&mut self) -> FlowResult<()> {
        if self.phase != Phase::Idle {
            return Ok(());
        }

        let identity = match self.gateway.current_identity(&self.session_token).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::info!(error = %e, "No usable session, leaving verification");
                if !matches!(e, GatewayError::Unauthenticated) {
                    self.notify(NoticeLevel::Error, "Error fetching user data");
                }
                self.phase = Phase::Redirected(Exit::SignIn);
                return Err(FlowError::Identity(e.to_string()));
            }
        };

        if identity.email_verified {
            tracing::debug!(email = %identity.email, "Email already verified");
            self.notify(NoticeLevel::Info, "No verification needed");
            self.identity = Some(identity);
            self.phase = Phase::Redirected(Exit::AlreadyVerified);
            return Ok(());
        }

        self.identity = Some(identity);
        self.phase = Phase::AwaitingCode;

        if self.challenge_requested {
            return Ok(());
        }
        self.challenge_requested = true;
        self.request_challenge().await.map(|_| ())
    }

    /// Request a new code. A no-op while the cooldown runs.
    ///
    /// Returns whether a new code was sent. The server may still refuse
    /// with its own cooldown, which restarts the countdown and returns false.
    pub async fn resend(&mut self) -> FlowResult<bool> {
        if !self.can_resend() {
            tracing::debug!(
                retry_in_secs = self.seconds_until_resend(),
                "Resend ignored during cooldown"
            );
            return Ok(false);
        }
        self.request_challenge().await
    }

    /// Submit a candidate code
    pub async fn submit(&mut self, code: &str) -> FlowResult<()> {
        if self.phase != Phase::AwaitingCode {
            return Ok(());
        }

        // A previous attempt got the code accepted but failed to mark the
        // account; the server would now report no active challenge.
        if !self.code_accepted {
            match self.gateway.verify_code(&self.session_token, code).await {
                Ok(VerifyResult::Accepted) => self.code_accepted = true,
                Ok(VerifyResult::Rejected(reason)) => {
                    self.notify(NoticeLevel::Error, reject_message(&reason));
                    return Err(FlowError::Challenge(reason));
                }
                Err(e) => return Err(self.network_failure("Error during verification", e)),
            }
        }

        let email = self
            .identity
            .as_ref()
            .map(|i| i.email.clone())
            .unwrap_or_default();

        if let Err(e) = self
            .gateway
            .mark_email_verified(&self.session_token, &email)
            .await
        {
            return Err(self.network_failure("Verification failed", e));
        }

        tracing::info!(email = %email, "Email verified");
        self.phase = Phase::Verified;
        self.teardown();
        self.notify(NoticeLevel::Info, "Email verified successfully!");
        Ok(())
    }

    /// Feed a UI event to the input; submits when the code is complete.
    pub async fn handle_input(&mut self, event: InputEvent) -> FlowResult<InputOutcome> {
        if self.phase != Phase::AwaitingCode {
            return Ok(InputOutcome::Ignored);
        }

        let outcome = self.input.apply(event);
        if let InputOutcome::Submit(code) = &outcome {
            self.submit(code).await?;
        }
        Ok(outcome)
    }

    /// Stop the countdown; called when the view goes away
    pub fn teardown(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.stop();
        }
    }

    /// Returns whether a new code was issued
    async fn request_challenge(&mut self) -> FlowResult<bool> {
        match self.gateway.request_challenge(&self.session_token).await {
            Ok(challenge) => {
                self.on_challenge_issued(challenge);
                Ok(true)
            }
            Err(GatewayError::Cooldown { retry_after_secs }) => {
                // A code is already out there; wait for it
                tracing::debug!(retry_after_secs, "Challenge already active");
                self.start_cooldown(retry_after_secs);
                Ok(false)
            }
            Err(e) => Err(self.network_failure("Could not send verification code", e)),
        }
    }

    fn on_challenge_issued(&mut self, challenge: IssuedChallenge) {
        let segments = usize::from(challenge.code_length);
        if segments != self.input.segments() {
            self.input = OtpInputController::new(segments);
        } else {
            self.input.reset();
        }
        self.code_accepted = false;
        self.start_cooldown(u64::from(challenge.cooldown_secs));

        match challenge.delivery_warning {
            Some(warning) => {
                tracing::warn!(warning = %warning, "Verification mail not delivered");
                self.notify(NoticeLevel::Warning, warning);
            }
            None => {
                let email = self.identity.as_ref().map(|i| i.email.as_str()).unwrap_or("");
                let message = format!("Verification code sent to {email}");
                self.notify(NoticeLevel::Info, message);
            }
        }
    }

    fn start_cooldown(&mut self, secs: u64) {
        self.resend_available_at = Some(Instant::now() + Duration::from_secs(secs));
        match &mut self.countdown {
            Some(countdown) => countdown.restart(secs),
            None => self.countdown = Some(Countdown::start(secs)),
        }
    }

    fn network_failure(&mut self, message: &str, err: GatewayError) -> FlowError {
        if matches!(err, GatewayError::Unauthenticated) {
            tracing::info!("Session expired during verification");
            self.phase = Phase::Redirected(Exit::SignIn);
            self.teardown();
            return FlowError::Identity(err.to_string());
        }
        tracing::warn!(error = %err, "{}", message);
        self.notify(NoticeLevel::Error, message);
        FlowError::Network(err.to_string())
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }
}
