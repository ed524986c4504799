//! Verification Router

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::application::config::VerificationConfig;
use crate::domain::services::{CodeGenerator, Mailer, OsRngCodeGenerator};
use crate::infra::postgres::PgVerificationRepository;
use crate::presentation::handlers::{self, VerificationAppState, VerificationStore};

/// Create the verification router with the PostgreSQL repository and OS RNG codes
pub fn verification_router<M>(
    repo: PgVerificationRepository,
    mailer: M,
    config: VerificationConfig,
) -> Router
where
    M: Mailer + Sync + 'static,
{
    verification_router_generic(repo, OsRngCodeGenerator, mailer, config)
}

/// Create a verification router for any repository, generator and mailer
///
/// Routes are relative; the caller nests them (the API mounts them under `/api`).
pub fn verification_router_generic<R, G, M>(
    repo: R,
    generator: G,
    mailer: M,
    config: VerificationConfig,
) -> Router
where
    R: VerificationStore,
    G: CodeGenerator + 'static,
    M: Mailer + Sync + 'static,
{
    let state = VerificationAppState {
        repo: Arc::new(repo),
        generator: Arc::new(generator),
        mailer: Arc::new(mailer),
        config: Arc::new(config),
    };

    Router::new()
        .route("/auth/me", get(handlers::current_identity::<R, G, M>))
        .route(
            "/auth/verifymail",
            put(handlers::mark_email_verified::<R, G, M>),
        )
        .route(
            "/verification/challenge",
            post(handlers::issue_challenge::<R, G, M>),
        )
        .route(
            "/verification/verify",
            post(handlers::verify_code::<R, G, M>),
        )
        .route(
            "/verification/status",
            get(handlers::challenge_status::<R, G, M>),
        )
        .with_state(state)
}
