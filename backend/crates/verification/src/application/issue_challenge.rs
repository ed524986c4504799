//! Issue Challenge Use Case
//!
//! Issues (or re-issues) a code for an email and hands it to the mailer.

use chrono::Utc;
use std::sync::Arc;

use crate::application::config::VerificationConfig;
use crate::domain::entities::VerificationChallenge;
use crate::domain::repository::ChallengeRepository;
use crate::domain::services::{CodeGenerator, Mailer, VerificationMail};
use crate::domain::value_objects::Email;
use crate::error::{VerificationError, VerificationResult};

#[derive(Debug, Clone)]
pub struct IssueChallengeOutput {
    pub challenge_id: uuid::Uuid,
    pub code_length: u8,
    pub cooldown_secs: u32,
    pub resend_available_at_ms: i64,
    pub expires_at_ms: i64,
    /// Set when the challenge was stored but the mail could not be sent
    pub delivery_warning: Option<String>,
}

pub struct IssueChallengeUseCase<C, G, M>
where
    C: ChallengeRepository,
    G: CodeGenerator,
    M: Mailer,
{
    challenge_repo: Arc<C>,
    generator: Arc<G>,
    mailer: Arc<M>,
    config: Arc<VerificationConfig>,
}

impl<C, G, M> IssueChallengeUseCase<C, G, M>
where
    C: ChallengeRepository,
    G: CodeGenerator,
    M: Mailer,
{
    pub fn new(
        challenge_repo: Arc<C>,
        generator: Arc<G>,
        mailer: Arc<M>,
        config: Arc<VerificationConfig>,
    ) -> Self {
        Self {
            challenge_repo,
            generator,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, email: &str) -> VerificationResult<IssueChallengeOutput> {
        self.execute_at(email, Utc::now().timestamp_millis()).await
    }

    pub async fn execute_at(
        &self,
        email: &str,
        now_ms: i64,
    ) -> VerificationResult<IssueChallengeOutput> {
        let email = Email::new(email)?;

        // A resend is only allowed once the previous challenge's cooldown is over
        if let Some(previous) = self.challenge_repo.find_by_email(&email).await? {
            if !previous.can_resend(now_ms) {
                return Err(VerificationError::ResendCooldown {
                    retry_after_secs: previous.time_until_resend(now_ms),
                });
            }
        }

        let code = self.generator.generate(self.config.code_length);
        let challenge = VerificationChallenge::issue(
            email,
            &code,
            &self.config.policy(),
            &self.config.code_secret,
            now_ms,
        );

        // Replaces the previous challenge; its code can no longer verify
        self.challenge_repo.upsert(&challenge).await?;

        tracing::info!(
            challenge_id = %challenge.id,
            email = %challenge.email,
            expires_at_ms = challenge.expires_at_ms,
            "Issued verification challenge"
        );

        let mail = VerificationMail::compose(
            challenge.email.as_str(),
            &code,
            self.config.code_ttl_minutes(),
            &self.config.platform_name,
        );

        let delivery_warning = match self.mailer.deliver(&mail).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    challenge_id = %challenge.id,
                    error = %e,
                    "Verification mail delivery failed"
                );
                Some(format!(
                    "We couldn't send the verification email ({e}). Please request a new code."
                ))
            }
        };

        Ok(IssueChallengeOutput {
            challenge_id: challenge.id.into_uuid(),
            code_length: self.config.code_length.into(),
            cooldown_secs: challenge.cooldown_secs,
            resend_available_at_ms: challenge.resend_available_at_ms(),
            expires_at_ms: challenge.expires_at_ms,
            delivery_warning,
        })
    }
}
