//! Application Configuration
//!
//! Configuration for the verification application layer.

use std::time::Duration;

use crate::domain::entities::ChallengePolicy;
use crate::domain::value_objects::CodeLength;

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Digits per code
    pub code_length: CodeLength,
    /// Minimum time between two challenges for the same email
    pub resend_cooldown: Duration,
    /// Lifetime of a code, independent of the cooldown
    pub code_ttl: Duration,
    /// Wrong guesses before a challenge is invalidated
    pub max_attempts: u32,
    /// HMAC key for stored code digests (32 bytes).
    /// Random unless set; digests from a previous process then stop verifying.
    pub code_secret: [u8; 32],
    /// Name shown in the verification mail
    pub platform_name: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_length: CodeLength::DEFAULT,
            resend_cooldown: Duration::from_secs(90),
            code_ttl: Duration::from_secs(600),
            max_attempts: 5,
            code_secret: random_secret(),
            platform_name: "EventHub".to_string(),
        }
    }
}

impl VerificationConfig {
    /// Default timings with a fixed code secret
    pub fn with_secret(code_secret: [u8; 32]) -> Self {
        Self {
            code_secret,
            ..Default::default()
        }
    }

    pub fn policy(&self) -> ChallengePolicy {
        ChallengePolicy {
            cooldown_secs: u32::try_from(self.resend_cooldown.as_secs()).unwrap_or(u32::MAX),
            ttl_secs: u32::try_from(self.code_ttl.as_secs()).unwrap_or(u32::MAX),
            max_attempts: self.max_attempts,
        }
    }

    /// Rounded up for the mail text
    pub fn code_ttl_minutes(&self) -> u32 {
        u32::try_from(self.code_ttl.as_secs().div_ceil(60)).unwrap_or(u32::MAX)
    }
}

fn random_secret() -> [u8; 32] {
    let mut secret = [0u8; 32];
    secret.copy_from_slice(&platform::crypto::random_bytes(32));
    secret
}
