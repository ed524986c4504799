//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.

pub mod challenge_status;
pub mod config;
pub mod current_identity;
pub mod issue_challenge;
pub mod mark_verified;
pub mod verify_code;

pub use challenge_status::{ChallengeStatusOutput, ChallengeStatusUseCase};
pub use current_identity::CurrentIdentityUseCase;
pub use issue_challenge::{IssueChallengeOutput, IssueChallengeUseCase};
pub use mark_verified::MarkVerifiedUseCase;
pub use verify_code::VerifyCodeUseCase;
