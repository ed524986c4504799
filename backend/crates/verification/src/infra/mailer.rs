//! Mailer Implementations
//!
//! `SmtpMailer` sends through an SMTP relay; `LogMailer` only records the
//! delivery in the log, for local development without a relay.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};

use crate::domain::services::{DeliveryError, Mailer, OutgoingMail};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    /// `From:` header, e.g. `EventHub <no-reply@example.com>`
    pub from: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            use_tls: true,
            from: "no-reply@localhost".to_string(),
        }
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| DeliveryError::InvalidConfig(format!("Invalid from address: {}", e)))?;

        let mut builder = if config.use_tls {
            let tls_params = TlsParameters::new(config.host.clone())
                .map_err(|e| DeliveryError::InvalidConfig(format!("TLS configuration: {}", e)))?;

            // 465 is implicit TLS, everything else negotiates STARTTLS
            let tls = if config.port == 465 {
                Tls::Wrapper(tls_params)
            } else {
                Tls::Required(tls_params)
            };

            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .tls(tls)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port)
        };

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, mail: &OutgoingMail) -> Result<Message, DeliveryError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| DeliveryError::InvalidAddress(format!("{}: {}", mail.to, e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(mail.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(mail.html.clone()),
                    ),
            )
            .map_err(|e| DeliveryError::SendFailed(format!("Failed to build email: {}", e)))
    }
}

impl Mailer for SmtpMailer {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        let message = self.build_message(mail)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::SendFailed(e.to_string()))?;

        tracing::info!(to = %mail.to, "Verification mail sent");
        Ok(())
    }
}

/// Development mailer: logs instead of sending
#[derive(Debug, Clone, Default)]
pub struct LogMailer {
    /// Include the body (and therefore the code) in the log line
    pub log_body: bool,
}

impl Mailer for LogMailer {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        if self.log_body {
            tracing::info!(to = %mail.to, subject = %mail.subject, body = %mail.text, "Mail (not sent)");
        } else {
            tracing::info!(to = %mail.to, subject = %mail.subject, "Mail (not sent)");
        }
        Ok(())
    }
}
