//! Standalone degen hunter: scans, alerts and tracks until Ctrl-C.

use anyhow::{Context, Result};
use degen_hunter::hunter::{
    DegenHunter, DexScreenerSource, HunterConfig, SqliteLedger, TelegramSink,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = HunterConfig::from_env().context("Invalid configuration")?;
    info!(
        "Starting degen hunter on {} every {}s (min score {}, SL {}%, TP {}%)",
        config.chains.iter().cloned().collect::<Vec<_>>().join(", "),
        config.scan_interval_seconds,
        config.min_degen_score,
        config.default_stop_loss_pct,
        config.default_take_profit_pct
    );

    let http_client = Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()
        .context("Failed to build HTTP client")?;

    let storage = Arc::new(SqliteLedger::new(&config.db_path).await?);
    let source = Arc::new(DexScreenerSource::new(http_client.clone(), &config));
    let sink = Arc::new(TelegramSink::new(http_client, &config));

    let hunter = Arc::new(DegenHunter::new(config, source, sink, storage));
    let (stop_tx, stop_rx) = watch::channel(false);

    let runner = {
        let hunter = hunter.clone();
        tokio::spawn(async move { hunter.run(stop_rx).await })
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Ctrl-C received, finishing current cycle");
    let _ = stop_tx.send(true);

    if let Err(e) = runner.await {
        error!("Hunter task failed: {}", e);
    }
    info!(
        "Degen hunter exited after {} cycles",
        hunter.stats().cycles_completed()
    );
    Ok(())
}
