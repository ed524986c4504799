//! Orchestrator tests against a scripted gateway

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::gateway::{
    GatewayError, Identity, IssuedChallenge, RejectReason, VerificationGateway, VerifyResult,
};

/// Scripted server. Challenge requests succeed unless a failure is queued;
/// `verify_code` accepts only `code`.
#[derive(Clone, Default)]
struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    identity: Option<Identity>,
    code: String,
    cooldown_secs: u32,
    delivery_warning: Option<String>,
    challenge_failures: VecDeque<GatewayError>,
    verify_failures: VecDeque<GatewayError>,
    mark_failures: VecDeque<GatewayError>,
    challenge_requests: usize,
    verify_calls: Vec<String>,
    marked: Vec<String>,
}

impl FakeGateway {
    fn new(email: &str, verified: bool, code: &str) -> Self {
        let gateway = Self::default();
        {
            let mut state = gateway.state.lock().unwrap();
            state.identity = Some(Identity {
                email: email.to_string(),
                email_verified: verified,
            });
            state.code = code.to_string();
            state.cooldown_secs = 90;
        }
        gateway
    }

    fn signed_out() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }
}

impl VerificationGateway for FakeGateway {
    async fn current_identity(&self, session_token: &str) -> Result<Identity, GatewayError> {
        assert_eq!(session_token, "tok");
        self.with(|s| s.identity.clone().ok_or(GatewayError::Unauthenticated))
    }

    async fn request_challenge(&self, _session_token: &str) -> Result<IssuedChallenge, GatewayError> {
        self.with(|s| {
            if let Some(err) = s.challenge_failures.pop_front() {
                return Err(err);
            }
            s.challenge_requests += 1;
            Ok(IssuedChallenge {
                code_length: s.code.len() as u8,
                cooldown_secs: s.cooldown_secs,
                resend_available_at_ms: 0,
                expires_at_ms: 0,
                delivery_warning: s.delivery_warning.clone(),
            })
        })
    }

    async fn verify_code(&self, _session_token: &str, code: &str) -> Result<VerifyResult, GatewayError> {
        self.with(|s| {
            if let Some(err) = s.verify_failures.pop_front() {
                return Err(err);
            }
            s.verify_calls.push(code.to_string());
            if code == s.code {
                Ok(VerifyResult::Accepted)
            } else {
                Ok(VerifyResult::Rejected(RejectReason::CodeMismatch))
            }
        })
    }

    async fn mark_email_verified(&self, _session_token: &str, email: &str) -> Result<(), GatewayError> {
        self.with(|s| {
            if let Some(err) = s.mark_failures.pop_front() {
                return Err(err);
            }
            s.marked.push(email.to_string());
            if let Some(identity) = s.identity.as_mut() {
                identity.email_verified = true;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod orchestrator_tests {
    use super::*;
    use crate::error::FlowError;
    use crate::input::{InputEvent, InputOutcome};
    use crate::orchestrator::{Exit, NoticeLevel, Phase, VerificationOrchestrator};
    use tokio::time::sleep;

    async fn started(gateway: &FakeGateway) -> VerificationOrchestrator<FakeGateway> {
        let mut flow = VerificationOrchestrator::new(gateway.clone(), "tok");
        flow.start().await.unwrap();
        flow
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_without_session_redirects() {
        let gateway = FakeGateway::signed_out();
        let mut flow = VerificationOrchestrator::new(gateway.clone(), "tok");

        let err = flow.start().await.unwrap_err();
        assert!(matches!(err, FlowError::Identity(_)));
        assert!(err.is_fatal());
        assert_eq!(flow.phase(), Phase::Redirected(Exit::SignIn));
        assert_eq!(gateway.with(|s| s.challenge_requests), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identity_transport_failure_redirects_with_notice() {
        struct Down;
        impl VerificationGateway for Down {
            async fn current_identity(&self, _: &str) -> Result<Identity, GatewayError> {
                Err(GatewayError::Transport("connection refused".into()))
            }
            async fn request_challenge(&self, _: &str) -> Result<IssuedChallenge, GatewayError> {
                unreachable!()
            }
            async fn verify_code(&self, _: &str, _: &str) -> Result<VerifyResult, GatewayError> {
                unreachable!()
            }
            async fn mark_email_verified(&self, _: &str, _: &str) -> Result<(), GatewayError> {
                unreachable!()
            }
        }

        let mut flow = VerificationOrchestrator::new(Down, "tok");
        assert!(flow.start().await.is_err());
        assert_eq!(flow.phase(), Phase::Redirected(Exit::SignIn));
        let notices = flow.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_verified_needs_nothing() {
        let gateway = FakeGateway::new("a@b.com", true, "7421");
        let flow = started(&gateway).await;

        assert_eq!(flow.phase(), Phase::Redirected(Exit::AlreadyVerified));
        assert_eq!(gateway.with(|s| s.challenge_requests), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_issues_exactly_once() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        let mut flow = started(&gateway).await;
        flow.start().await.unwrap();
        flow.start().await.unwrap();

        assert_eq!(flow.phase(), Phase::AwaitingCode);
        assert_eq!(gateway.with(|s| s.challenge_requests), 1);
        assert_eq!(flow.countdown_secs(), 90);
        assert!(!flow.can_resend());

        let notices = flow.take_notices();
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert!(notices[0].message.contains("a@b.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_typed_code_is_verified_and_marked() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        let mut flow = started(&gateway).await;

        let mut outcomes = Vec::new();
        for (index, ch) in "7421".chars().enumerate() {
            outcomes.push(flow.handle_input(InputEvent::Digit { index, ch }).await.unwrap());
        }

        assert_eq!(outcomes.last(), Some(&InputOutcome::Submit("7421".into())));
        assert_eq!(gateway.with(|s| s.verify_calls.clone()), vec!["7421"]);
        assert_eq!(gateway.with(|s| s.marked.clone()), vec!["a@b.com"]);
        assert_eq!(flow.phase(), Phase::Verified);
        assert!(flow.subscribe_countdown().is_none());

        // No further prompts once verified
        let outcome = flow.handle_input(InputEvent::Digit { index: 0, ch: '1' }).await.unwrap();
        assert_eq!(outcome, InputOutcome::Ignored);
        assert!(!flow.resend().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_code_keeps_flow_and_countdown() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        let mut flow = started(&gateway).await;
        sleep(Duration::from_millis(10_500)).await;

        flow.handle_input(InputEvent::Paste("1111".into())).await.unwrap();
        let err = flow.handle_input(InputEvent::Digit { index: 3, ch: '1' }).await.unwrap_err();

        assert!(matches!(err, FlowError::Challenge(RejectReason::CodeMismatch)));
        assert_eq!(flow.phase(), Phase::AwaitingCode);
        assert_eq!(flow.countdown_secs(), 80);
        assert_eq!(flow.input().focus(), 3);
        assert!(gateway.with(|s| s.marked.is_empty()));

        let notices = flow.take_notices();
        assert_eq!(notices.last().unwrap().message, "Invalid code");
    }

    #[tokio::test(start_paused = true)]
    async fn test_paste_does_not_submit() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        let mut flow = started(&gateway).await;

        let outcome = flow.handle_input(InputEvent::Paste("7421".into())).await.unwrap();
        assert_eq!(outcome, InputOutcome::Updated);
        assert!(gateway.with(|s| s.verify_calls.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_gated_by_cooldown() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        let mut flow = started(&gateway).await;

        sleep(Duration::from_secs(89)).await;
        assert!(!flow.can_resend());
        assert_eq!(flow.seconds_until_resend(), 1);
        assert!(!flow.resend().await.unwrap());
        assert_eq!(gateway.with(|s| s.challenge_requests), 1);

        sleep(Duration::from_millis(1_100)).await;
        assert!(flow.can_resend());
        assert_eq!(flow.countdown_secs(), 0);

        gateway.with(|s| s.code = "5093".into());
        assert!(flow.resend().await.unwrap());
        assert_eq!(gateway.with(|s| s.challenge_requests), 2);
        assert!(!flow.can_resend());
        assert_eq!(flow.countdown_secs(), 90);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_clears_input() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        let mut flow = started(&gateway).await;
        flow.handle_input(InputEvent::Paste("1234".into())).await.unwrap();

        sleep(Duration::from_secs(90)).await;
        flow.resend().await.unwrap();
        assert_eq!(flow.input().values(), vec!["", "", "", ""]);
        assert_eq!(flow.input().focus(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_challenge_restores_countdown() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        gateway.with(|s| {
            s.challenge_failures
                .push_back(GatewayError::Cooldown { retry_after_secs: 42 })
        });
        let flow = started(&gateway).await;

        assert_eq!(flow.phase(), Phase::AwaitingCode);
        assert_eq!(flow.countdown_secs(), 42);
        assert_eq!(flow.seconds_until_resend(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_cooldown_on_resend_sends_nothing() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        let mut flow = started(&gateway).await;
        flow.take_notices();

        // Another tab issued a code since ours
        sleep(Duration::from_secs(90)).await;
        gateway.with(|s| {
            s.challenge_failures
                .push_back(GatewayError::Cooldown { retry_after_secs: 30 })
        });

        assert!(!flow.resend().await.unwrap());
        assert_eq!(gateway.with(|s| s.challenge_requests), 1);
        assert!(!flow.can_resend());
        assert_eq!(flow.countdown_secs(), 30);
        assert!(flow.take_notices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_warning_is_surfaced() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        gateway.with(|s| s.delivery_warning = Some("We couldn't send the verification email".into()));
        let mut flow = started(&gateway).await;

        assert_eq!(flow.phase(), Phase::AwaitingCode);
        let notices = flow.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_on_verify_is_not_retried() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        gateway.with(|s| {
            s.verify_failures
                .push_back(GatewayError::Transport("timeout".into()))
        });
        let mut flow = started(&gateway).await;

        let err = flow.submit("7421").await.unwrap_err();
        assert!(matches!(err, FlowError::Network(_)));
        assert_eq!(flow.phase(), Phase::AwaitingCode);
        assert!(gateway.with(|s| s.verify_calls.is_empty()));

        // The user retries by hand
        flow.submit("7421").await.unwrap();
        assert_eq!(flow.phase(), Phase::Verified);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_mark_retries_without_reverifying() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        gateway.with(|s| {
            s.mark_failures.push_back(GatewayError::Status {
                status: 500,
                code: None,
                message: "Internal error".into(),
            })
        });
        let mut flow = started(&gateway).await;

        assert!(flow.submit("7421").await.is_err());
        assert_eq!(flow.phase(), Phase::AwaitingCode);

        flow.submit("7421").await.unwrap();
        assert_eq!(flow.phase(), Phase::Verified);
        assert_eq!(gateway.with(|s| s.verify_calls.len()), 1);
        assert_eq!(gateway.with(|s| s.marked.clone()), vec!["a@b.com"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_lost_mid_flow() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        gateway.with(|s| s.verify_failures.push_back(GatewayError::Unauthenticated));
        let mut flow = started(&gateway).await;

        let err = flow.submit("7421").await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(flow.phase(), Phase::Redirected(Exit::SignIn));
        assert!(flow.subscribe_countdown().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_stops_countdown() {
        let gateway = FakeGateway::new("a@b.com", false, "7421");
        let mut flow = started(&gateway).await;
        let mut rx = flow.subscribe_countdown().unwrap();

        flow.teardown();
        sleep(Duration::from_secs(3)).await;
        assert_eq!(*rx.borrow_and_update(), 90);
    }
}
