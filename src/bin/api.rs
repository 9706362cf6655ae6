use kyc_orchestrator::{
    api::start_server,
    config::AppConfig,
    documents::TemplateFiller,
    extractor::ClaudeExtractor,
    notifier::ResendNotifier,
    pipeline::Pipeline,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;

    if config.anthropic_api_key.is_empty() {
        warn!("ANTHROPIC_API_KEY not set, extraction requests will fail");
    }
    if config.resend_api_key.is_empty() {
        warn!("RESEND_API_KEY not set, notifications will be skipped");
    }

    info!("🚀 KYC Orchestrator - API Server");
    info!("📍 Port: {}", config.port);

    // Create components
    let extractor = Arc::new(ClaudeExtractor::new(config.anthropic_api_key.clone())?);
    let documents = Arc::new(TemplateFiller::new(
        config.templates_dir.clone(),
        config.output_dir.clone(),
    )?);
    let notifier = Arc::new(ResendNotifier::new(
        config.resend_api_key.clone(),
        config.from_email.clone(),
        config.notification_email.clone(),
    ));

    let pipeline = Arc::new(Pipeline::new(
        extractor,
        documents,
        notifier,
        config.pipeline.clone(),
    ));

    info!("✅ Pipeline initialized");
    info!("📡 Starting API server...");

    start_server(pipeline, config.port).await?;

    Ok(())
}
