//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request errors are rendered by the
//! verification crate as `kernel` problem documents.

mod settings;

use axum::{
    Router, http,
    http::{Method, header},
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verification::mail::{LogMailer, Mailer, SmtpMailer};
use verification::{
    InMemoryVerificationRepository, OsRngCodeGenerator, PgVerificationRepository,
    VerificationConfig, VerificationStore, verification_router_generic,
};

use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "eventhub_api=info,verification=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let api = match &settings.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;

            tracing::info!("Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let repo = PgVerificationRepository::new(pool);

            // Errors here should not prevent server startup
            if let Err(e) = repo.cleanup_expired().await {
                tracing::warn!(
                    error = %e,
                    "Verification challenge cleanup failed, continuing anyway"
                );
            }

            build_api(repo, &settings)?
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            build_api(InMemoryVerificationRepository::new(), &settings)?
        }
    };

    let allowed_origins: Vec<http::HeaderValue> = settings
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", settings.bind_addr);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Pick the mailer for the configured store
fn build_api<R>(repo: R, settings: &Settings) -> anyhow::Result<Router>
where
    R: VerificationStore,
{
    let config = settings.verification.clone();

    match &settings.smtp {
        Some(smtp) => {
            let mailer = SmtpMailer::new(smtp)?;
            tracing::info!(host = %smtp.host, port = smtp.port, "Sending mail via SMTP");
            Ok(routes(repo, mailer, config))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, verification mail is only logged");
            let mailer = LogMailer {
                log_body: settings.log_mail_body,
            };
            Ok(routes(repo, mailer, config))
        }
    }
}

fn routes<R, M>(repo: R, mailer: M, config: VerificationConfig) -> Router
where
    R: VerificationStore,
    M: Mailer + Sync + 'static,
{
    tracing::info!(
        code_length = u8::from(config.code_length),
        cooldown_secs = config.resend_cooldown.as_secs(),
        code_ttl_secs = config.code_ttl.as_secs(),
        max_attempts = config.max_attempts,
        "Verification configured"
    );
    verification_router_generic(repo, OsRngCodeGenerator, mailer, config)
}
