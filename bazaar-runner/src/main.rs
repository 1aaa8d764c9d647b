use anyhow::Result;
use bazaar_api::run as run_api;
use bazaar_core::Config;
use bazaar_core::MarketContext;
use tokio;
use tracing;
use tracing_subscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Bazaar marketplace API");

    // Loads .env before reading the environment
    let config = Config::from_env()?;

    let ctx = MarketContext::new(config).await?;
    tracing::info!("Marketplace context initialized");

    // Runs until ctrl-c or SIGTERM, then drains in-flight requests
    let result = run_api(ctx.clone()).await;

    ctx.shutdown();
    tracing::info!("Shutdown complete");

    result
}
