//! Domain Entities
//!
//! `VerificationChallenge` is the server-held state machine behind email
//! verification:
//!
//! ```text
//! (none) --issue--> Pending --verify ok--------> Verified
//!                     |  \--expires_at passed--> Expired
//!                     |   \-max_attempts misses-> Invalid
//!                     \--issue (resend)--> Pending (new code, old one gone)
//! ```
//!
//! Every transition takes `now_ms` explicitly so the machine stays a pure
//! function of its inputs.

use derive_more::Display;
use kernel::id::ChallengeId;
use platform::crypto::{hmac_sha256, verify_hmac_sha256};

use crate::domain::value_objects::{Email, VerificationCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Pending,
    Verified,
    Expired,
    Invalid,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Pending => "pending",
            ChallengeStatus::Verified => "verified",
            ChallengeStatus::Expired => "expired",
            ChallengeStatus::Invalid => "invalid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ChallengeStatus::Pending),
            "verified" => Some(ChallengeStatus::Verified),
            "expired" => Some(ChallengeStatus::Expired),
            "invalid" => Some(ChallengeStatus::Invalid),
            _ => None,
        }
    }
}

/// Why a submitted code was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RejectReason {
    #[display("Invalid verification code")]
    CodeMismatch,
    #[display("No active verification code")]
    NoActiveChallenge,
    #[display("Verification code expired")]
    Expired,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::CodeMismatch => "CODE_MISMATCH",
            RejectReason::NoActiveChallenge => "NO_ACTIVE_CHALLENGE",
            RejectReason::Expired => "EXPIRED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Accepted,
    Rejected(RejectReason),
}

/// Timing and attempt limits applied when a challenge is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengePolicy {
    pub cooldown_secs: u32,
    pub ttl_secs: u32,
    pub max_attempts: u32,
}

/// One issued code for one email address
#[derive(Debug, Clone)]
pub struct VerificationChallenge {
    pub id: ChallengeId,
    pub email: Email,
    /// HMAC-SHA256(secret, "email:code"); the raw code is never stored
    pub code_mac: [u8; 32],
    pub issued_at_ms: i64,
    pub cooldown_secs: u32,
    pub expires_at_ms: i64,
    pub status: ChallengeStatus,
    pub failed_attempts: u32,
    pub max_attempts: u32,
}

impl VerificationChallenge {
    pub fn issue(
        email: Email,
        code: &VerificationCode,
        policy: &ChallengePolicy,
        secret: &[u8; 32],
        now_ms: i64,
    ) -> Self {
        let code_mac = Self::code_mac(secret, &email, code.as_str());
        Self {
            id: ChallengeId::new(),
            email,
            code_mac,
            issued_at_ms: now_ms,
            cooldown_secs: policy.cooldown_secs,
            expires_at_ms: now_ms + i64::from(policy.ttl_secs) * 1000,
            status: ChallengeStatus::Pending,
            failed_attempts: 0,
            max_attempts: policy.max_attempts,
        }
    }

    /// Binding the email into the MAC keeps a digest from one address
    /// useless for another.
    pub fn code_mac(secret: &[u8; 32], email: &Email, code: &str) -> [u8; 32] {
        hmac_sha256(secret, Self::mac_message(email, code).as_bytes())
    }

    fn mac_message(email: &Email, code: &str) -> String {
        format!("{}:{}", email.as_str(), code)
    }

    pub fn resend_available_at_ms(&self) -> i64 {
        self.issued_at_ms + i64::from(self.cooldown_secs) * 1000
    }

    pub fn can_resend(&self, now_ms: i64) -> bool {
        now_ms >= self.resend_available_at_ms()
    }

    /// Whole seconds until a resend is allowed, rounded up; 0 once allowed
    pub fn time_until_resend(&self, now_ms: i64) -> u64 {
        let remaining_ms = self.resend_available_at_ms() - now_ms;
        if remaining_ms <= 0 {
            0
        } else {
            (remaining_ms as u64).div_ceil(1000)
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    pub fn is_pending(&self) -> bool {
        self.status == ChallengeStatus::Pending
    }

    /// Check a candidate against this challenge's code.
    ///
    /// Accepting makes the challenge inert: later calls report
    /// `NoActiveChallenge`. The status and attempt counter are updated in
    /// place; the caller persists them.
    pub fn verify(&mut self, candidate: &str, secret: &[u8; 32], now_ms: i64) -> VerifyOutcome {
        match self.status {
            ChallengeStatus::Pending => {}
            ChallengeStatus::Expired => return VerifyOutcome::Rejected(RejectReason::Expired),
            ChallengeStatus::Verified | ChallengeStatus::Invalid => {
                return VerifyOutcome::Rejected(RejectReason::NoActiveChallenge);
            }
        }

        if self.is_expired(now_ms) {
            self.status = ChallengeStatus::Expired;
            return VerifyOutcome::Rejected(RejectReason::Expired);
        }

        let message = Self::mac_message(&self.email, candidate);
        if verify_hmac_sha256(secret, message.as_bytes(), &self.code_mac) {
            self.status = ChallengeStatus::Verified;
            return VerifyOutcome::Accepted;
        }

        self.failed_attempts += 1;
        if self.max_attempts > 0 && self.failed_attempts >= self.max_attempts {
            self.status = ChallengeStatus::Invalid;
        }
        VerifyOutcome::Rejected(RejectReason::CodeMismatch)
    }
}

/// The authenticated user as seen by the verification flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: Email,
    pub email_verified: bool,
}
