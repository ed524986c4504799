//! Environment Configuration
//!
//! Reads the server's settings from the process environment (after `.env`
//! has been loaded). Unset variables fall back to defaults; malformed ones
//! are startup errors.

use anyhow::{Context, bail};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use verification::VerificationConfig;
use verification::mail::SmtpConfig;
use verification::models::CodeLength;

pub struct Settings {
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub verification: VerificationConfig,
    /// `None` means mail is logged, not sent
    pub smtp: Option<SmtpConfig>,
    pub log_mail_body: bool,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = parse_var("BIND_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 31113)));

        let frontend_origins = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            bind_addr,
            frontend_origins,
            verification: verification_config()?,
            smtp: smtp_config()?,
            log_mail_body: parse_var("LOG_MAIL_BODY")?.unwrap_or(cfg!(debug_assertions)),
        })
    }
}

fn verification_config() -> anyhow::Result<VerificationConfig> {
    let mut config = match env::var("VERIFICATION_SECRET") {
        Ok(secret_b64) => {
            let bytes = platform::crypto::from_base64(&secret_b64)
                .context("VERIFICATION_SECRET is not valid base64")?;
            let secret: [u8; 32] = bytes
                .as_slice()
                .try_into()
                .context("VERIFICATION_SECRET must decode to 32 bytes")?;
            VerificationConfig::with_secret(secret)
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("VERIFICATION_SECRET not set, using a random secret");
            VerificationConfig::default()
        }
        Err(_) => bail!("VERIFICATION_SECRET must be set in production"),
    };

    if let Some(digits) = parse_var::<u8>("VERIFICATION_CODE_LENGTH")? {
        config.code_length = CodeLength::new(digits).with_context(|| {
            format!(
                "VERIFICATION_CODE_LENGTH must be between {} and {}",
                CodeLength::MIN,
                CodeLength::MAX
            )
        })?;
    }
    if let Some(secs) = parse_var("VERIFICATION_COOLDOWN_SECS")? {
        config.resend_cooldown = Duration::from_secs(secs);
    }
    if let Some(secs) = parse_var("VERIFICATION_CODE_TTL_SECS")? {
        config.code_ttl = Duration::from_secs(secs);
    }
    if let Some(max) = parse_var("VERIFICATION_MAX_ATTEMPTS")? {
        config.max_attempts = max;
    }
    if let Ok(name) = env::var("PLATFORM_NAME") {
        config.platform_name = name;
    }

    Ok(config)
}

fn smtp_config() -> anyhow::Result<Option<SmtpConfig>> {
    let Ok(host) = env::var("SMTP_HOST") else {
        return Ok(None);
    };

    let defaults = SmtpConfig::default();
    Ok(Some(SmtpConfig {
        host,
        port: parse_var("SMTP_PORT")?.unwrap_or(defaults.port),
        username: env::var("SMTP_USER").ok(),
        password: env::var("SMTP_PASSWORD").ok(),
        use_tls: parse_var("SMTP_TLS")?.unwrap_or(defaults.use_tls),
        from: env::var("MAIL_FROM").unwrap_or(defaults.from),
    }))
}

fn parse_var<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(None),
    }
}
