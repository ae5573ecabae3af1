//! Telegram control bot hosting the degen hunter.
//!
//! The hunter starts stopped; send /start from the configured chat.

use anyhow::{Context, Result};
use degen_hunter::control::{ControlBot, Supervisor};
use degen_hunter::hunter::{
    DegenHunter, DexScreenerSource, HunterConfig, SqliteLedger, TelegramSink,
};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = HunterConfig::from_env().context("Invalid configuration")?;

    // No client-wide timeout: getUpdates long-polls and each request sets its own.
    let http_client = Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let storage = Arc::new(SqliteLedger::new(&config.db_path).await?);
    let source = Arc::new(DexScreenerSource::new(http_client.clone(), &config));
    let sink = Arc::new(TelegramSink::new(http_client.clone(), &config));

    let hunter = Arc::new(DegenHunter::new(config.clone(), source, sink.clone(), storage));
    let bot = ControlBot::new(http_client, &config, sink, Supervisor::new(hunter));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let bot_task = tokio::spawn(bot.run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Ctrl-C received, shutting down control bot");
    let _ = shutdown_tx.send(true);
    bot_task.await.context("Control bot task failed")?;
    Ok(())
}
