//! Domain Services
//!
//! Code generation and mail delivery ports, plus the verification mail template.

use thiserror::Error;

use crate::domain::value_objects::{CodeLength, VerificationCode};

/// Produces fresh numeric codes.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, length: CodeLength) -> VerificationCode;
}

/// Uniform digits from the operating system's CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngCodeGenerator;

impl CodeGenerator for OsRngCodeGenerator {
    fn generate(&self, length: CodeLength) -> VerificationCode {
        let digits = platform::crypto::random_digits(length.get());
        // random_digits only yields ASCII digits of the requested length
        VerificationCode::parse(&digits, length)
            .unwrap_or_else(|| unreachable!("random_digits produced a malformed code"))
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to send mail: {0}")]
    SendFailed(String),

    #[error("Invalid mailer configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Delivers mail out of band
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), DeliveryError>;
}

/// Content of the "your verification code" mail
pub struct VerificationMail;

impl VerificationMail {
    pub const SUBJECT: &'static str = "Your Verification Code";

    pub fn compose(
        to: &str,
        code: &VerificationCode,
        expires_in_minutes: u32,
        platform_name: &str,
    ) -> OutgoingMail {
        OutgoingMail {
            to: to.to_string(),
            subject: Self::SUBJECT.to_string(),
            text: Self::text(code.as_str(), expires_in_minutes, platform_name),
            html: Self::html(code.as_str(), expires_in_minutes, platform_name),
        }
    }

    fn text(code: &str, minutes: u32, platform_name: &str) -> String {
        format!(
            "Your {platform_name} verification code is: {code}\n\n\
             This code will expire in {minutes} minutes.\n\n\
             If you didn't request this code, please ignore this email.\n"
        )
    }

    fn html(code: &str, minutes: u32, platform_name: &str) -> String {
        format!(
            r#"<div style="font-family: Arial, sans-serif; padding: 20px; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">{platform_name} Verification Code</h2>
  <p>Your verification code is:</p>
  <h1 style="color: #007bff; font-size: 32px; letter-spacing: 5px; padding: 10px; background-color: #f8f9fa; text-align: center; border-radius: 5px;">{code}</h1>
  <p>This code will expire in {minutes} minutes.</p>
  <p>If you didn't request this code, please ignore this email.</p>
</div>"#
        )
    }
}
