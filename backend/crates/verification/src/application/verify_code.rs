//! Verify Code Use Case

use chrono::Utc;
use std::sync::Arc;

use crate::application::config::VerificationConfig;
use crate::domain::entities::{RejectReason, VerifyOutcome};
use crate::domain::repository::ChallengeRepository;
use crate::domain::value_objects::Email;
use crate::error::VerificationResult;

const MAX_UPDATE_RETRIES: usize = 8;

pub struct VerifyCodeUseCase<C>
where
    C: ChallengeRepository,
{
    challenge_repo: Arc<C>,
    config: Arc<VerificationConfig>,
}

impl<C> VerifyCodeUseCase<C>
where
    C: ChallengeRepository,
{
    pub fn new(challenge_repo: Arc<C>, config: Arc<VerificationConfig>) -> Self {
        Self {
            challenge_repo,
            config,
        }
    }

    pub async fn execute(&self, email: &Email, candidate: &str) -> VerificationResult<VerifyOutcome> {
        self.execute_at(email, candidate, Utc::now().timestamp_millis())
            .await
    }

    pub async fn execute_at(
        &self,
        email: &Email,
        candidate: &str,
        now_ms: i64,
    ) -> VerificationResult<VerifyOutcome> {
        // Each lost compare-and-set means another request made progress
        for _ in 0..MAX_UPDATE_RETRIES {
            let Some(mut challenge) = self.challenge_repo.find_by_email(email).await? else {
                tracing::debug!(email = %email, "Verify without a challenge");
                return Ok(VerifyOutcome::Rejected(RejectReason::NoActiveChallenge));
            };

            let before = (challenge.status, challenge.failed_attempts);
            let outcome = challenge.verify(candidate.trim(), &self.config.code_secret, now_ms);

            if before != (challenge.status, challenge.failed_attempts)
                && !self.challenge_repo.update(&challenge, before.1).await?
            {
                tracing::debug!(challenge_id = %challenge.id, "Challenge changed during verify, retrying");
                continue;
            }

            match outcome {
                VerifyOutcome::Accepted => tracing::info!(
                    challenge_id = %challenge.id,
                    email = %email,
                    "Verification code accepted"
                ),
                VerifyOutcome::Rejected(reason) => tracing::info!(
                    challenge_id = %challenge.id,
                    reason = reason.code(),
                    failed_attempts = challenge.failed_attempts,
                    "Verification code rejected"
                ),
            }

            return Ok(outcome);
        }

        tracing::warn!(email = %email, "Verify kept losing to concurrent updates");
        Ok(VerifyOutcome::Rejected(RejectReason::CodeMismatch))
    }
}
