//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for GET /api/auth/me
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub email: String,
    pub email_verified: bool,
}

/// Request for PUT /api/auth/verifymail
#[derive(Debug, Clone, Deserialize)]
pub struct MarkVerifiedRequest {
    pub email: String,
}

/// Response for POST /api/verification/challenge
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub challenge_id: Uuid,
    pub code_length: u8,
    pub cooldown_secs: u32,
    pub resend_available_at_ms: i64,
    pub expires_at_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_warning: Option<String>,
}

/// Request for POST /api/verification/verify
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub code: String,
}

/// Response for GET /api/verification/status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub email_verified: bool,
    /// `None` when no challenge exists for the caller
    pub status: Option<&'static str>,
    pub can_resend: bool,
    pub resend_available_in_secs: u64,
    pub expires_at_ms: Option<i64>,
}
