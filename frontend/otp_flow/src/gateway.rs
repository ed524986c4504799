//! Verification API Gateway
//!
//! `VerificationGateway` is everything the flow needs from the server.
//! `HttpVerificationGateway` talks to the `/api` routes over HTTP with the
//! session token as a Bearer credential.

use reqwest::{Client, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub email: String,
    pub email_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedChallenge {
    pub code_length: u8,
    pub cooldown_secs: u32,
    pub resend_available_at_ms: i64,
    pub expires_at_ms: i64,
    #[serde(default)]
    pub delivery_warning: Option<String>,
}

/// Why the server did not accept a code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    CodeMismatch,
    NoActiveChallenge,
    Expired,
}

impl RejectReason {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "CODE_MISMATCH" => Some(RejectReason::CodeMismatch),
            "NO_ACTIVE_CHALLENGE" => Some(RejectReason::NoActiveChallenge),
            "EXPIRED" => Some(RejectReason::Expired),
            _ => None,
        }
    }

    fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::CONFLICT => Some(RejectReason::CodeMismatch),
            StatusCode::NOT_FOUND => Some(RejectReason::NoActiveChallenge),
            StatusCode::GONE => Some(RejectReason::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyResult {
    Accepted,
    Rejected(RejectReason),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Not authenticated")]
    Unauthenticated,

    /// A challenge is already active; a new one may be requested later
    #[error("Resend available in {retry_after_secs}s")]
    Cooldown { retry_after_secs: u64 },

    #[error("Request failed ({status}): {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

#[trait_variant::make(VerificationGateway: Send)]
pub trait LocalVerificationGateway {
    async fn current_identity(&self, session_token: &str) -> Result<Identity, GatewayError>;

    async fn request_challenge(&self, session_token: &str) -> Result<IssuedChallenge, GatewayError>;

    async fn verify_code(&self, session_token: &str, code: &str) -> Result<VerifyResult, GatewayError>;

    async fn mark_email_verified(&self, session_token: &str, email: &str) -> Result<(), GatewayError>;
}

/// Problem body returned by the server on errors
#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    code: &'a str,
}

#[derive(Serialize)]
struct MarkVerifiedBody<'a> {
    email: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpVerificationGateway {
    base_url: String,
    client: Client,
}

impl HttpVerificationGateway {
    /// `base_url` is the server origin, e.g. `http://localhost:31113`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

async fn read_problem(response: Response) -> (StatusCode, Problem) {
    let status = response.status();
    let problem = response.json::<Problem>().await.unwrap_or_default();
    (status, problem)
}

fn status_error(status: StatusCode, problem: Problem) -> GatewayError {
    if status == StatusCode::UNAUTHORIZED {
        return GatewayError::Unauthenticated;
    }
    GatewayError::Status {
        status: status.as_u16(),
        message: problem
            .detail
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
        code: problem.code,
    }
}

fn retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(1)
}

impl VerificationGateway for HttpVerificationGateway {
    async fn current_identity(&self, session_token: &str) -> Result<Identity, GatewayError> {
        let response = self
            .client
            .get(self.url("/auth/me"))
            .bearer_auth(session_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, problem) = read_problem(response).await;
            return Err(status_error(status, problem));
        }

        Ok(response.json().await?)
    }

    async fn request_challenge(&self, session_token: &str) -> Result<IssuedChallenge, GatewayError> {
        let response = self
            .client
            .post(self.url("/verification/challenge"))
            .bearer_auth(session_token)
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::Cooldown {
                retry_after_secs: retry_after(&response),
            });
        }
        if !response.status().is_success() {
            let (status, problem) = read_problem(response).await;
            return Err(status_error(status, problem));
        }

        Ok(response.json().await?)
    }

    async fn verify_code(&self, session_token: &str, code: &str) -> Result<VerifyResult, GatewayError> {
        let response = self
            .client
            .post(self.url("/verification/verify"))
            .bearer_auth(session_token)
            .json(&VerifyBody { code })
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(VerifyResult::Accepted);
        }

        let (status, problem) = read_problem(response).await;
        let reason = problem
            .code
            .as_deref()
            .and_then(RejectReason::from_code)
            .or_else(|| RejectReason::from_status(status));

        match reason {
            Some(reason) if status != StatusCode::UNAUTHORIZED => {
                tracing::debug!(status = status.as_u16(), ?reason, "Code rejected");
                Ok(VerifyResult::Rejected(reason))
            }
            _ => Err(status_error(status, problem)),
        }
    }

    async fn mark_email_verified(&self, session_token: &str, email: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .put(self.url("/auth/verifymail"))
            .bearer_auth(session_token)
            .json(&MarkVerifiedBody { email })
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, problem) = read_problem(response).await;
            return Err(status_error(status, problem));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_api_prefix() {
        let gateway = HttpVerificationGateway::new("http://localhost:31113/");
        assert_eq!(
            gateway.url("/auth/me"),
            "http://localhost:31113/api/auth/me"
        );
    }

    #[test]
    fn test_reject_reason_mapping() {
        assert_eq!(
            RejectReason::from_code("CODE_MISMATCH"),
            Some(RejectReason::CodeMismatch)
        );
        assert_eq!(RejectReason::from_code("RESEND_COOLDOWN"), None);
        assert_eq!(
            RejectReason::from_status(StatusCode::GONE),
            Some(RejectReason::Expired)
        );
        assert_eq!(RejectReason::from_status(StatusCode::BAD_REQUEST), None);
    }

    #[test]
    fn test_status_error() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, Problem::default()),
            GatewayError::Unauthenticated
        ));

        let err = status_error(
            StatusCode::FORBIDDEN,
            Problem {
                detail: Some("Email has not been verified".into()),
                code: Some("NOT_VERIFIED".into()),
            },
        );
        match err {
            GatewayError::Status {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 403);
                assert_eq!(code.as_deref(), Some("NOT_VERIFIED"));
                assert_eq!(message, "Email has not been verified");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_challenge_deserialization() {
        let json = r#"{
            "challengeId": "6f1c2f4e-8a8e-4b8e-9a52-3d1f0b7c9e11",
            "codeLength": 4,
            "cooldownSecs": 90,
            "resendAvailableAtMs": 1700000090000,
            "expiresAtMs": 1700000600000
        }"#;
        let challenge: IssuedChallenge = serde_json::from_str(json).unwrap();
        assert_eq!(challenge.code_length, 4);
        assert_eq!(challenge.cooldown_secs, 90);
        assert!(challenge.delivery_warning.is_none());
    }

    #[test]
    fn test_identity_deserialization() {
        let identity: Identity =
            serde_json::from_str(r#"{"email":"a@b.com","emailVerified":false}"#).unwrap();
        assert_eq!(identity.email, "a@b.com");
        assert!(!identity.email_verified);
    }
}
