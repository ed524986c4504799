//! HTTP Handlers
//!
//! Every route acts on the caller's own account, identified by the session
//! token (Bearer header, or the `token` cookie).

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;

use crate::application::config::VerificationConfig;
use crate::application::{
    ChallengeStatusUseCase, CurrentIdentityUseCase, IssueChallengeUseCase, MarkVerifiedUseCase,
    VerifyCodeUseCase,
};
use crate::domain::entities::{Identity, VerifyOutcome};
use crate::domain::repository::{AccountRepository, ChallengeRepository};
use crate::domain::services::{CodeGenerator, Mailer};
use crate::error::{VerificationError, VerificationResult};
use crate::presentation::dto::{
    ChallengeResponse, IdentityResponse, MarkVerifiedRequest, StatusResponse, VerifyRequest,
};

/// Storage needed by the verification routes
pub trait VerificationStore:
    ChallengeRepository + AccountRepository + Send + Sync + 'static
{
}

impl<T> VerificationStore for T where
    T: ChallengeRepository + AccountRepository + Send + Sync + 'static
{
}

/// Shared state for verification handlers
pub struct VerificationAppState<R, G, M> {
    pub repo: Arc<R>,
    pub generator: Arc<G>,
    pub mailer: Arc<M>,
    pub config: Arc<VerificationConfig>,
}

// Manual impl: only the Arcs are cloned, so G and M need not be Clone
impl<R, G, M> Clone for VerificationAppState<R, G, M> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            generator: self.generator.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
        }
    }
}

async fn authenticate<R: VerificationStore>(
    repo: &Arc<R>,
    headers: &HeaderMap,
) -> VerificationResult<Identity> {
    let token = platform::token::extract_session_token(headers);
    CurrentIdentityUseCase::new(repo.clone())
        .execute(token.as_deref())
        .await
}

/// GET /api/auth/me
pub async fn current_identity<R, G, M>(
    State(state): State<VerificationAppState<R, G, M>>,
    headers: HeaderMap,
) -> VerificationResult<Json<IdentityResponse>>
where
    R: VerificationStore,
    G: CodeGenerator + 'static,
    M: Mailer + Sync + 'static,
{
    let identity = authenticate(&state.repo, &headers).await?;

    Ok(Json(IdentityResponse {
        email: identity.email.as_str().to_string(),
        email_verified: identity.email_verified,
    }))
}

/// PUT /api/auth/verifymail
pub async fn mark_email_verified<R, G, M>(
    State(state): State<VerificationAppState<R, G, M>>,
    headers: HeaderMap,
    Json(req): Json<MarkVerifiedRequest>,
) -> VerificationResult<StatusCode>
where
    R: VerificationStore,
    G: CodeGenerator + 'static,
    M: Mailer + Sync + 'static,
{
    let identity = authenticate(&state.repo, &headers).await?;

    MarkVerifiedUseCase::new(state.repo.clone(), state.repo.clone())
        .execute(&identity, &req.email)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/verification/challenge
pub async fn issue_challenge<R, G, M>(
    State(state): State<VerificationAppState<R, G, M>>,
    headers: HeaderMap,
) -> VerificationResult<Json<ChallengeResponse>>
where
    R: VerificationStore,
    G: CodeGenerator + 'static,
    M: Mailer + Sync + 'static,
{
    let identity = authenticate(&state.repo, &headers).await?;
    if identity.email_verified {
        return Err(VerificationError::AlreadyVerified);
    }

    let use_case = IssueChallengeUseCase::new(
        state.repo.clone(),
        state.generator.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    let output = use_case.execute(identity.email.as_str()).await?;

    Ok(Json(ChallengeResponse {
        challenge_id: output.challenge_id,
        code_length: output.code_length,
        cooldown_secs: output.cooldown_secs,
        resend_available_at_ms: output.resend_available_at_ms,
        expires_at_ms: output.expires_at_ms,
        delivery_warning: output.delivery_warning,
    }))
}

/// POST /api/verification/verify
pub async fn verify_code<R, G, M>(
    State(state): State<VerificationAppState<R, G, M>>,
    headers: HeaderMap,
    Json(req): Json<VerifyRequest>,
) -> VerificationResult<StatusCode>
where
    R: VerificationStore,
    G: CodeGenerator + 'static,
    M: Mailer + Sync + 'static,
{
    let identity = authenticate(&state.repo, &headers).await?;

    let outcome = VerifyCodeUseCase::new(state.repo.clone(), state.config.clone())
        .execute(&identity.email, &req.code)
        .await?;

    match outcome {
        VerifyOutcome::Accepted => Ok(StatusCode::NO_CONTENT),
        VerifyOutcome::Rejected(reason) => Err(VerificationError::Rejected(reason)),
    }
}

/// GET /api/verification/status
pub async fn challenge_status<R, G, M>(
    State(state): State<VerificationAppState<R, G, M>>,
    headers: HeaderMap,
) -> VerificationResult<Json<StatusResponse>>
where
    R: VerificationStore,
    G: CodeGenerator + 'static,
    M: Mailer + Sync + 'static,
{
    let identity = authenticate(&state.repo, &headers).await?;

    let status = ChallengeStatusUseCase::new(state.repo.clone())
        .execute(&identity.email)
        .await?;

    let response = match status {
        Some(s) => StatusResponse {
            email_verified: identity.email_verified,
            status: Some(s.status.as_str()),
            can_resend: s.can_resend,
            resend_available_in_secs: s.resend_available_in_secs,
            expires_at_ms: Some(s.expires_at_ms),
        },
        None => StatusResponse {
            email_verified: identity.email_verified,
            status: None,
            can_resend: !identity.email_verified,
            resend_available_in_secs: 0,
            expires_at_ms: None,
        },
    };

    Ok(Json(response))
}
