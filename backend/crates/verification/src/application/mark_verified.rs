//! Mark Email Verified Use Case
//!
//! Flips the account's verified flag, but only on the strength of a
//! challenge this server accepted.

use std::sync::Arc;

use crate::domain::entities::{ChallengeStatus, Identity};
use crate::domain::repository::{AccountRepository, ChallengeRepository};
use crate::domain::value_objects::Email;
use crate::error::{VerificationError, VerificationResult};

pub struct MarkVerifiedUseCase<A, C>
where
    A: AccountRepository,
    C: ChallengeRepository,
{
    account_repo: Arc<A>,
    challenge_repo: Arc<C>,
}

impl<A, C> MarkVerifiedUseCase<A, C>
where
    A: AccountRepository,
    C: ChallengeRepository,
{
    pub fn new(account_repo: Arc<A>, challenge_repo: Arc<C>) -> Self {
        Self {
            account_repo,
            challenge_repo,
        }
    }

    /// `requested_email` must be the caller's own address.
    pub async fn execute(&self, identity: &Identity, requested_email: &str) -> VerificationResult<()> {
        let requested = Email::new(requested_email)?;
        if requested != identity.email {
            tracing::warn!(
                session_email = %identity.email,
                requested_email = %requested,
                "Mark-verified requested for another account"
            );
            return Err(VerificationError::NotVerified);
        }

        if identity.email_verified {
            return Ok(());
        }

        let verified = self
            .challenge_repo
            .find_by_email(&identity.email)
            .await?
            .is_some_and(|c| c.status == ChallengeStatus::Verified);

        if !verified {
            return Err(VerificationError::NotVerified);
        }

        if !self.account_repo.mark_email_verified(&identity.email).await? {
            return Err(VerificationError::AccountNotFound);
        }

        // The challenge has done its job
        self.challenge_repo.delete_by_email(&identity.email).await?;

        tracing::info!(email = %identity.email, "Email marked verified");
        Ok(())
    }
}
