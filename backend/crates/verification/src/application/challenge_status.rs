//! Challenge Status Use Case
//!
//! Read-only view of the active challenge: lets a reloaded client restore
//! its resend countdown without issuing a new code.

use chrono::Utc;
use std::sync::Arc;

use crate::domain::entities::ChallengeStatus;
use crate::domain::repository::ChallengeRepository;
use crate::domain::value_objects::Email;
use crate::error::VerificationResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeStatusOutput {
    pub status: ChallengeStatus,
    pub can_resend: bool,
    pub resend_available_in_secs: u64,
    pub expires_at_ms: i64,
}

pub struct ChallengeStatusUseCase<C>
where
    C: ChallengeRepository,
{
    challenge_repo: Arc<C>,
}

impl<C> ChallengeStatusUseCase<C>
where
    C: ChallengeRepository,
{
    pub fn new(challenge_repo: Arc<C>) -> Self {
        Self { challenge_repo }
    }

    pub async fn execute(&self, email: &Email) -> VerificationResult<Option<ChallengeStatusOutput>> {
        self.execute_at(email, Utc::now().timestamp_millis()).await
    }

    pub async fn execute_at(
        &self,
        email: &Email,
        now_ms: i64,
    ) -> VerificationResult<Option<ChallengeStatusOutput>> {
        let Some(challenge) = self.challenge_repo.find_by_email(email).await? else {
            return Ok(None);
        };

        // Expiry is reported without persisting it; verify does that
        let status = if challenge.is_pending() && challenge.is_expired(now_ms) {
            ChallengeStatus::Expired
        } else {
            challenge.status
        };

        Ok(Some(ChallengeStatusOutput {
            status,
            can_resend: challenge.can_resend(now_ms),
            resend_available_in_secs: challenge.time_until_resend(now_ms),
            expires_at_ms: challenge.expires_at_ms,
        }))
    }
}
