use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use log::{error, info, warn};

use solana_wallet_watcher::{
    config::AppConfig,
    market::{BirdeyeClient, MarketDataCache},
    pipeline::EnrichmentPipeline,
    server::{router, AppState},
    wallet::{spawn_reload_task, WalletDirectory},
    webhook::WebhookRegistrar,
};

const WALLET_RELOAD_PERIOD: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = AppConfig::load_from_env()?;

    // A missing or unreadable wallet list is fatal; the service refuses to
    // run without one.
    let wallets = Arc::new(WalletDirectory::load(&config.wallets_csv_path)?);
    info!(
        "tracking {} wallets from {}",
        wallets.len(),
        config.wallets_csv_path
    );
    spawn_reload_task(Arc::clone(&wallets), WALLET_RELOAD_PERIOD);

    let source = Arc::new(BirdeyeClient::new(config.birdeye_api_key.clone())?);
    let cache = Arc::new(MarketDataCache::new(source));
    let pipeline = Arc::new(EnrichmentPipeline::new(Arc::clone(&wallets), cache));

    register_webhook(&config, &wallets).await;

    let app = router(AppState { pipeline });
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Starting Solana Wallet Watcher on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn register_webhook(config: &AppConfig, wallets: &WalletDirectory) {
    let (Some(api_key), Some(webhook_url)) = (&config.helius_api_key, &config.webhook_url) else {
        info!("webhook registration skipped (HELIUS_API_KEY or WEBHOOK_URL not set)");
        return;
    };

    let registrar = match WebhookRegistrar::new(api_key.clone()) {
        Ok(registrar) => registrar,
        Err(err) => {
            warn!("could not build webhook registrar: {err}");
            return;
        }
    };

    match registrar.register(webhook_url, wallets.addresses()).await {
        Ok(webhook) => info!(
            "registered webhook {} for {} addresses",
            webhook.webhook_id,
            wallets.len()
        ),
        Err(err) => warn!(
            "webhook registration failed: {err} (continuing; an existing registration may still deliver)"
        ),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
    }
    info!("shutdown signal received");
}
