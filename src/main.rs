mod callback;
mod classifier;
mod config;
mod formatter;
mod gateway;
mod messenger;
mod pacing;
mod router;
mod update;
mod webhook;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::gateway::instagram::InstagramClient;
use crate::gateway::youtube::YouTubeClient;
use crate::messenger::telegram::TelegramMessenger;
use crate::pacing::TokioPacer;
use crate::router::Router;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,instadl_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Bind address: {}", config.server.bind_address);
    info!("  Webhook path: {}", config.server.webhook_path);
    info!("  Profile gateway: {}", config.instagram.profile_endpoint);
    info!("  Download gateway: {}", config.instagram.download_endpoint);
    info!("  Pacing: {:?}", config.delivery.pacing_interval());

    let instagram = InstagramClient::new(config.instagram.clone())?;
    let youtube = YouTubeClient::new(config.youtube.clone())?;
    let router = Arc::new(Router::new(
        Arc::new(TelegramMessenger::new(&config.telegram.bot_token)),
        Arc::new(instagram),
        Arc::new(youtube),
        Arc::new(TokioPacer),
        &config,
    ));

    let app = webhook::app(router, &config.server.webhook_path);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_address))?;

    info!("Bot is listening on {}", config.server.bind_address);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
