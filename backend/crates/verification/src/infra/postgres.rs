//! PostgreSQL Repository Implementations

use chrono::Utc;
use kernel::id::ChallengeId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{ChallengeStatus, Identity, VerificationChallenge};
use crate::domain::repository::{AccountRepository, ChallengeRepository};
use crate::domain::value_objects::Email;
use crate::error::{VerificationError, VerificationResult};

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgVerificationRepository {
    pool: PgPool,
}

impl PgVerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete challenges whose code has expired
    pub async fn cleanup_expired(&self) -> VerificationResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted =
            sqlx::query("DELETE FROM email_verification_challenges WHERE expires_at_ms < $1")
                .bind(now_ms)
                .execute(&self.pool)
                .await?
                .rows_affected();

        tracing::info!(challenges = deleted, "Cleaned up expired verification challenges");

        Ok(deleted)
    }
}

impl ChallengeRepository for PgVerificationRepository {
    async fn upsert(&self, challenge: &VerificationChallenge) -> VerificationResult<()> {
        // Primary key is the email, so a resend overwrites the old row
        sqlx::query(
            r#"
            INSERT INTO email_verification_challenges (
                email,
                challenge_id,
                code_mac,
                issued_at_ms,
                cooldown_secs,
                expires_at_ms,
                status,
                failed_attempts,
                max_attempts
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (email) DO UPDATE SET
                challenge_id = EXCLUDED.challenge_id,
                code_mac = EXCLUDED.code_mac,
                issued_at_ms = EXCLUDED.issued_at_ms,
                cooldown_secs = EXCLUDED.cooldown_secs,
                expires_at_ms = EXCLUDED.expires_at_ms,
                status = EXCLUDED.status,
                failed_attempts = EXCLUDED.failed_attempts,
                max_attempts = EXCLUDED.max_attempts
            "#,
        )
        .bind(challenge.email.as_str())
        .bind(challenge.id.into_uuid())
        .bind(challenge.code_mac.as_slice())
        .bind(challenge.issued_at_ms)
        .bind(challenge.cooldown_secs as i32)
        .bind(challenge.expires_at_ms)
        .bind(challenge.status.as_str())
        .bind(challenge.failed_attempts as i32)
        .bind(challenge.max_attempts as i32)
        .execute(&self.pool)
        .await?;

        tracing::info!(challenge_id = %challenge.id, "Challenge stored");

        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> VerificationResult<Option<VerificationChallenge>> {
        let row = sqlx::query_as::<_, ChallengeRow>(
            r#"
            SELECT
                email,
                challenge_id,
                code_mac,
                issued_at_ms,
                cooldown_secs,
                expires_at_ms,
                status,
                failed_attempts,
                max_attempts
            FROM email_verification_challenges
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ChallengeRow::into_challenge).transpose()
    }

    async fn update(
        &self,
        challenge: &VerificationChallenge,
        expected_failed_attempts: u32,
    ) -> VerificationResult<bool> {
        // Superseded, already settled or concurrently counted rows do not match
        let updated = sqlx::query(
            r#"
            UPDATE email_verification_challenges
            SET status = $3, failed_attempts = $4
            WHERE email = $1
              AND challenge_id = $2
              AND status = 'pending'
              AND failed_attempts = $5
            "#,
        )
        .bind(challenge.email.as_str())
        .bind(challenge.id.into_uuid())
        .bind(challenge.status.as_str())
        .bind(challenge.failed_attempts as i32)
        .bind(expected_failed_attempts as i32)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn delete_by_email(&self, email: &Email) -> VerificationResult<()> {
        sqlx::query("DELETE FROM email_verification_challenges WHERE email = $1")
            .bind(email.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl AccountRepository for PgVerificationRepository {
    async fn find_by_session(&self, session_token: &str) -> VerificationResult<Option<Identity>> {
        let token_hash = platform::crypto::sha256(session_token.as_bytes());
        let now_ms = Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, (String, bool)>(
            r#"
            SELECT a.email, a.email_verified
            FROM auth_sessions s
            JOIN accounts a ON a.account_id = s.account_id
            WHERE s.token_hash = $1 AND s.expires_at_ms > $2
            "#,
        )
        .bind(token_hash.as_slice())
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(email, email_verified)| Identity {
            email: Email::from_db(email),
            email_verified,
        }))
    }

    async fn mark_email_verified(&self, email: &Email) -> VerificationResult<bool> {
        let updated = sqlx::query(
            "UPDATE accounts SET email_verified = TRUE, updated_at = now() WHERE lower(email) = $1",
        )
        .bind(email.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }
}

// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct ChallengeRow {
    email: String,
    challenge_id: Uuid,
    code_mac: Vec<u8>,
    issued_at_ms: i64,
    cooldown_secs: i32,
    expires_at_ms: i64,
    status: String,
    failed_attempts: i32,
    max_attempts: i32,
}

impl ChallengeRow {
    fn into_challenge(self) -> VerificationResult<VerificationChallenge> {
        let code_mac: [u8; 32] = self.code_mac.as_slice().try_into().map_err(|_| {
            VerificationError::Internal(format!("code_mac has {} bytes", self.code_mac.len()))
        })?;
        let status = ChallengeStatus::parse(&self.status).ok_or_else(|| {
            VerificationError::Internal(format!("unknown challenge status {:?}", self.status))
        })?;

        Ok(VerificationChallenge {
            id: ChallengeId::from_uuid(self.challenge_id),
            email: Email::from_db(self.email),
            code_mac,
            issued_at_ms: self.issued_at_ms,
            cooldown_secs: self.cooldown_secs.max(0) as u32,
            expires_at_ms: self.expires_at_ms,
            status,
            failed_attempts: self.failed_attempts.max(0) as u32,
            max_attempts: self.max_attempts.max(0) as u32,
        })
    }
}
