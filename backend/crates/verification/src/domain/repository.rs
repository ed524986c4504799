//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the infra layer.

use crate::domain::entities::{Identity, VerificationChallenge};
use crate::domain::value_objects::Email;
use crate::error::VerificationResult;

/// Challenge repository trait
///
/// Keyed by email: at most one challenge exists per address.
#[trait_variant::make(ChallengeRepository: Send)]
pub trait LocalChallengeRepository {
    /// Store a challenge, replacing whatever the email had before
    async fn upsert(&self, challenge: &VerificationChallenge) -> VerificationResult<()>;

    async fn find_by_email(&self, email: &Email) -> VerificationResult<Option<VerificationChallenge>>;

    /// Persist status/attempt changes as a compare-and-set.
    ///
    /// Applies only while the stored challenge has the same id, is still
    /// pending and has `expected_failed_attempts` misses. Returns false when
    /// another verify or a resend got there first.
    async fn update(
        &self,
        challenge: &VerificationChallenge,
        expected_failed_attempts: u32,
    ) -> VerificationResult<bool>;

    async fn delete_by_email(&self, email: &Email) -> VerificationResult<()>;
}

/// Account repository trait
///
/// Sessions and accounts are created by the login flow; this side only
/// reads them and flips the verified flag.
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    async fn find_by_session(&self, session_token: &str) -> VerificationResult<Option<Identity>>;

    /// Idempotent. Returns false if no account has this email.
    async fn mark_email_verified(&self, email: &Email) -> VerificationResult<bool>;
}
