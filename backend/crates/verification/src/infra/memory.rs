//! In-memory Repository Implementation
//!
//! Used when no database is configured and by the test suite.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::{Identity, VerificationChallenge};
use crate::domain::repository::{AccountRepository, ChallengeRepository};
use crate::domain::value_objects::Email;
use crate::error::VerificationResult;

#[derive(Clone, Default)]
pub struct InMemoryVerificationRepository {
    challenges: Arc<RwLock<HashMap<Email, VerificationChallenge>>>,
    accounts: Arc<RwLock<HashMap<Email, bool>>>,
    sessions: Arc<RwLock<HashMap<String, Email>>>,
}

impl InMemoryVerificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account (normally done by sign-up)
    pub async fn seed_account(&self, email: Email, email_verified: bool) {
        self.accounts.write().await.insert(email, email_verified);
    }

    /// Register a session token (normally done by sign-in)
    pub async fn seed_session(&self, token: impl Into<String>, email: Email) {
        self.sessions.write().await.insert(token.into(), email);
    }

    pub async fn is_email_verified(&self, email: &Email) -> Option<bool> {
        self.accounts.read().await.get(email).copied()
    }

    /// Drop challenges whose code has expired
    pub async fn cleanup_expired(&self, now_ms: i64) -> usize {
        let mut challenges = self.challenges.write().await;
        let before = challenges.len();
        challenges.retain(|_, c| !c.is_expired(now_ms));
        before - challenges.len()
    }
}

impl ChallengeRepository for InMemoryVerificationRepository {
    async fn upsert(&self, challenge: &VerificationChallenge) -> VerificationResult<()> {
        let previous = self
            .challenges
            .write()
            .await
            .insert(challenge.email.clone(), challenge.clone());

        if let Some(previous) = previous {
            tracing::debug!(
                superseded = %previous.id,
                challenge_id = %challenge.id,
                "Challenge superseded"
            );
        }
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> VerificationResult<Option<VerificationChallenge>> {
        Ok(self.challenges.read().await.get(email).cloned())
    }

    async fn update(
        &self,
        challenge: &VerificationChallenge,
        expected_failed_attempts: u32,
    ) -> VerificationResult<bool> {
        let mut challenges = self.challenges.write().await;
        match challenges.get_mut(&challenge.email) {
            Some(stored)
                if stored.id == challenge.id
                    && stored.is_pending()
                    && stored.failed_attempts == expected_failed_attempts =>
            {
                *stored = challenge.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_by_email(&self, email: &Email) -> VerificationResult<()> {
        self.challenges.write().await.remove(email);
        Ok(())
    }
}

impl AccountRepository for InMemoryVerificationRepository {
    async fn find_by_session(&self, session_token: &str) -> VerificationResult<Option<Identity>> {
        let Some(email) = self.sessions.read().await.get(session_token).cloned() else {
            return Ok(None);
        };

        let verified = self.accounts.read().await.get(&email).copied();
        Ok(verified.map(|email_verified| Identity {
            email,
            email_verified,
        }))
    }

    async fn mark_email_verified(&self, email: &Email) -> VerificationResult<bool> {
        match self.accounts.write().await.get_mut(email) {
            Some(verified) => {
                *verified = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
