use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing_subscriber::EnvFilter;

use relay_api::config::AppConfig;
use relay_api::services::email_service::{EmailService, OtpMailer};
use relay_api::services::intent_service::{DialogflowClient, DisabledIntentDetector, IntentDetector};
use relay_api::services::otp_service::{spawn_expiry_sweeper, InMemoryOtpStore, OtpStore};
use relay_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    tracing::info!("App config loaded: {}", config.get_config_info());

    let app_state = initialize_app_state(&config).await?;
    let app = build_router(app_state);
    start_server(app, &config).await
}

async fn initialize_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = InMemoryOtpStore::new(config.otp_ttl).context("Failed to create OTP store")?;
    if store.expires() {
        tracing::info!("OTP expiry enabled, sweeping every {:?}", config.otp_sweep_interval);
    } else {
        tracing::warn!("OTP_TTL_SECONDS not set; issued codes never expire");
    }
    let otp_store: Arc<dyn OtpStore> = Arc::new(store.clone());
    if store.expires() {
        spawn_expiry_sweeper(otp_store.clone(), config.otp_sweep_interval);
    }

    let mailer: Arc<dyn OtpMailer> =
        Arc::new(EmailService::new(&config.mail).context("Failed to configure mail transport")?);

    let state = AppState::new(otp_store, mailer, Arc::new(DisabledIntentDetector));

    tracing::info!("Attempting to initialize intent service...");
    match DialogflowClient::from_config(&config.intent).await {
        Ok(client) => {
            tracing::info!("Intent service initialized successfully");
            let intent: Arc<dyn IntentDetector> = Arc::new(client);
            Ok(state.with_intent(intent))
        }
        Err(e) => {
            tracing::error!("Failed to initialize intent service: {}", e);
            tracing::warn!("Chatbot queries will fail until PROJECT_ID and SERVICE_KEY are set");
            Ok(state)
        }
    }
}

async fn start_server(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server running on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
