//! Monitoring cycle orchestration.
//!
//! One cycle scans every configured chain for alert-worthy launches, then
//! sweeps the tracked positions for stop-loss / take-profit exits. Failures of
//! a single chain, price lookup, delivery or ledger write are logged and never
//! abort the cycle.

use crate::hunter::alerts::AlertSink;
use crate::hunter::data_sources::SnapshotSource;
use crate::hunter::error::LookupError;
use crate::hunter::formatter;
use crate::hunter::position_tracker::{PositionTracker, SharedTracker};
use crate::hunter::scorer;
use crate::hunter::storage::HunterStorage;
use crate::hunter::types::{
    ExitEvent, HunterConfig, LaunchRecord, PriceAlertRecord, PumpRecord, ScoreResult,
    TrackedPosition,
};
use crate::types::{Address, TokenSnapshot};
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Upper bound on remembered launches per dedupe cache.
const DEDUPE_CAPACITY: u64 = 50_000;

/// Outcome of one monitoring cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Launches that passed the alert policy
    pub launches_found: usize,
    pub launch_alerts: usize,
    pub pump_alerts: usize,
    /// Exit alerts delivered
    pub exit_alerts: usize,
    /// Positions that hit a threshold, delivered or not
    pub exits_fired: usize,
    /// Chains whose scan failed
    pub chains_failed: usize,
    /// Tracked addresses whose price could not be fetched
    pub price_failures: usize,
}

impl CycleSummary {
    fn absorb(&mut self, other: CycleSummary) {
        self.launches_found += other.launches_found;
        self.launch_alerts += other.launch_alerts;
        self.pump_alerts += other.pump_alerts;
        self.exit_alerts += other.exit_alerts;
        self.exits_fired += other.exits_fired;
        self.chains_failed += other.chains_failed;
        self.price_failures += other.price_failures;
    }
}

/// Result of one position sweep.
#[derive(Debug, Default)]
pub struct PositionSweep {
    pub events: Vec<ExitEvent>,
    /// Exit alerts the sink accepted
    pub delivered: usize,
    pub price_failures: usize,
}

/// Lifetime counters, readable while the loop runs.
#[derive(Debug, Default)]
pub struct HunterStats {
    cycles_completed: AtomicU64,
    launch_alerts: AtomicU64,
    pump_alerts: AtomicU64,
    exit_alerts: AtomicU64,
    delivery_failures: AtomicU64,
}

impl HunterStats {
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn launch_alerts(&self) -> u64 {
        self.launch_alerts.load(Ordering::Relaxed)
    }

    pub fn pump_alerts(&self) -> u64 {
        self.pump_alerts.load(Ordering::Relaxed)
    }

    pub fn exit_alerts(&self) -> u64 {
        self.exit_alerts.load(Ordering::Relaxed)
    }

    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.load(Ordering::Relaxed)
    }

    fn record_cycle(&self, summary: &CycleSummary) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.launch_alerts.fetch_add(summary.launch_alerts as u64, Ordering::Relaxed);
        self.pump_alerts.fetch_add(summary.pump_alerts as u64, Ordering::Relaxed);
        self.exit_alerts.fetch_add(summary.exit_alerts as u64, Ordering::Relaxed);
    }
}

/// The monitoring loop and its collaborators.
pub struct DegenHunter {
    config: HunterConfig,
    source: Arc<dyn SnapshotSource>,
    sink: Arc<dyn AlertSink>,
    storage: Arc<dyn HunterStorage>,
    tracker: SharedTracker,
    launch_seen: Cache<Address, ()>,
    pump_seen: Cache<Address, ()>,
    stats: Arc<HunterStats>,
}

impl DegenHunter {
    pub fn new(
        config: HunterConfig,
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn AlertSink>,
        storage: Arc<dyn HunterStorage>,
    ) -> Self {
        Self::with_tracker(config, source, sink, storage, PositionTracker::shared())
    }

    /// Use an existing tracker, e.g. one shared with the control bot.
    pub fn with_tracker(
        config: HunterConfig,
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn AlertSink>,
        storage: Arc<dyn HunterStorage>,
        tracker: SharedTracker,
    ) -> Self {
        let cooldown = Duration::from_secs(config.alert_cooldown_seconds.max(1));
        let dedupe_cache = || {
            Cache::builder()
                .max_capacity(DEDUPE_CAPACITY)
                .time_to_live(cooldown)
                .build()
        };

        info!(
            "Hunter configured for {} chain(s), min score {}, interval {}s",
            config.chains.len(),
            config.min_degen_score,
            config.scan_interval_seconds
        );

        Self {
            launch_seen: dedupe_cache(),
            pump_seen: dedupe_cache(),
            config,
            source,
            sink,
            storage,
            tracker,
            stats: Arc::new(HunterStats::default()),
        }
    }

    pub fn config(&self) -> &HunterConfig {
        &self.config
    }

    pub fn tracker(&self) -> SharedTracker {
        self.tracker.clone()
    }

    pub fn stats(&self) -> Arc<HunterStats> {
        self.stats.clone()
    }

    /// Deliver a message, logging instead of failing.
    async fn notify(&self, message: &str) -> bool {
        match self.sink.deliver(message).await {
            Ok(()) => true,
            Err(e) => {
                self.stats.delivery_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Alert delivery failed: {}", e);
                false
            }
        }
    }

    /// Scan one chain and alert on its launches.
    #[instrument(skip(self))]
    pub async fn scan_chain(&self, chain: &str) -> Result<CycleSummary, LookupError> {
        let snapshots = self.source.fetch_recent_pairs(chain).await?;
        let mut summary = CycleSummary::default();

        for snapshot in &snapshots {
            let result = scorer::evaluate(snapshot);
            if !scorer::should_alert(&result, self.config.min_degen_score) {
                debug!("{} scored {}, below alert policy", snapshot.symbol, result.score);
                continue;
            }
            summary.launches_found += 1;
            self.handle_launch(snapshot, &result, &mut summary).await;
        }

        info!(
            "{}: {} recent pairs, {} worth alerting",
            chain,
            snapshots.len(),
            summary.launches_found
        );
        Ok(summary)
    }

    async fn handle_launch(
        &self,
        snapshot: &TokenSnapshot,
        result: &ScoreResult,
        summary: &mut CycleSummary,
    ) {
        let now = chrono::Utc::now().timestamp_millis();

        // Dedupe keys are only set once the alert is out, so a failed
        // delivery is retried on the next cycle that still sees the event.
        if !self.launch_seen.contains_key(&snapshot.address) {
            info!(
                "New launch {} on {} scored {}{}",
                snapshot.symbol,
                snapshot.chain,
                result.score,
                if result.is_pumping { " (pumping)" } else { "" }
            );

            let delivered = self.notify(&formatter::format_launch_alert(snapshot, result)).await;
            if delivered {
                summary.launch_alerts += 1;
                self.launch_seen.insert(snapshot.address.clone(), ()).await;
                if result.is_pumping {
                    self.pump_seen.insert(snapshot.address.clone(), ()).await;
                }
            }

            let record = LaunchRecord {
                address: snapshot.address.clone(),
                name: snapshot.name.clone(),
                symbol: snapshot.symbol.clone(),
                chain: snapshot.chain.clone(),
                dex: snapshot.dex.clone(),
                price_usd: snapshot.price_usd,
                liquidity_usd: snapshot.liquidity_usd,
                score: result.score,
                is_pumping: result.is_pumping,
                seen_at: now,
            };
            if let Err(e) = self.storage.record_launch(&record).await {
                warn!("Failed to record launch {}: {:#}", snapshot.address, e);
            }
            if delivered && result.is_pumping {
                self.record_pump(snapshot, result, now).await;
            }
            return;
        }

        // Already announced: only a fresh pump is news.
        if result.is_pumping && !self.pump_seen.contains_key(&snapshot.address) {
            info!("Pump detected on known launch {}", snapshot.symbol);

            if self.notify(&formatter::format_pump_alert(snapshot)).await {
                summary.pump_alerts += 1;
                self.pump_seen.insert(snapshot.address.clone(), ()).await;
                self.record_pump(snapshot, result, now).await;
            }
        }
    }

    async fn record_pump(&self, snapshot: &TokenSnapshot, result: &ScoreResult, now: i64) {
        let record = PumpRecord {
            address: snapshot.address.clone(),
            symbol: snapshot.symbol.clone(),
            chain: snapshot.chain.clone(),
            price_change_5m: snapshot.price_change_5m,
            price_change_1h: snapshot.price_change_1h,
            volume_surge: snapshot.volume_surge,
            score: result.score,
            seen_at: now,
        };
        if let Err(e) = self.storage.record_pump(&record).await {
            warn!("Failed to record pump {}: {:#}", snapshot.address, e);
        }
    }

    /// Sweep tracked positions against current prices and alert on exits.
    ///
    /// Prices are fetched with the tracker unlocked; the sweep itself runs
    /// under the lock.
    #[instrument(skip(self))]
    pub async fn check_positions(&self) -> PositionSweep {
        let addresses = self.tracker.lock().await.addresses();
        if addresses.is_empty() {
            return PositionSweep::default();
        }

        let mut prices: HashMap<Address, Result<f64, LookupError>> = HashMap::new();
        for address in addresses {
            let price = self.source.fetch_current_price(&address).await;
            prices.insert(address, price);
        }
        let price_failures = prices.values().filter(|p| p.is_err()).count();

        let (events, thresholds) = {
            let mut tracker = self.tracker.lock().await;
            let thresholds: HashMap<Address, TrackedPosition> = tracker
                .positions()
                .map(|p| (p.address.clone(), p.clone()))
                .collect();
            let events = tracker.sweep(|address| {
                prices
                    .remove(address)
                    .unwrap_or_else(|| Err(LookupError::NotFetched(address.to_string())))
            });
            (events, thresholds)
        };

        let now = chrono::Utc::now().timestamp_millis();
        let mut delivered = 0;
        for event in &events {
            if self.notify(&formatter::format_exit_alert(event)).await {
                delivered += 1;
            }

            let Some(position) = thresholds.get(&event.address) else {
                continue;
            };
            let record = PriceAlertRecord {
                address: event.address.clone(),
                symbol: event.symbol.clone(),
                entry_price: event.entry_price,
                current_price: event.current_price,
                stop_loss: position.stop_loss,
                take_profit: position.take_profit,
                kind: event.kind,
                pnl_percent: event.pnl_percent,
                triggered_at: now,
            };
            if let Err(e) = self.storage.record_price_alert(&record).await {
                warn!("Failed to record price alert for {}: {:#}", event.address, e);
            }
        }

        PositionSweep { events, delivered, price_failures }
    }

    /// Run one full cycle.
    pub async fn run_cycle(&self) -> CycleSummary {
        info!("Cycle started at {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"));
        let mut summary = CycleSummary::default();

        for chain in self.config.chains.iter() {
            match self.scan_chain(chain).await {
                Ok(chain_summary) => summary.absorb(chain_summary),
                Err(e) => {
                    summary.chains_failed += 1;
                    warn!("Scan of {} failed: {}", chain, e);
                }
            }
        }

        let sweep = self.check_positions().await;
        summary.exits_fired = sweep.events.len();
        summary.exit_alerts = sweep.delivered;
        summary.price_failures = sweep.price_failures;

        self.stats.record_cycle(&summary);
        info!(
            "Cycle summary: {} launches, {} launch alerts, {} pump alerts, {}/{} exit alerts delivered",
            summary.launches_found,
            summary.launch_alerts,
            summary.pump_alerts,
            summary.exit_alerts,
            summary.exits_fired
        );
        summary
    }

    /// Run cycles until `stop` turns true or its sender is dropped.
    ///
    /// A cycle in progress always completes; only the sleep between cycles
    /// is interrupted.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) {
        let interval = Duration::from_secs(self.config.scan_interval_seconds.max(1));
        let chains: Vec<String> = self.config.chains.iter().cloned().collect();

        info!("Degen hunter running, interval {:?}", interval);
        self.notify(&formatter::format_startup_notice(self.config.scan_interval_seconds, &chains))
            .await;

        while !*stop.borrow() {
            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        error!("Stop signal sender dropped, shutting down");
                        break;
                    }
                }
            }
        }

        info!("Degen hunter stopped after {} cycles", self.stats.cycles_completed());
        self.notify(&formatter::format_stop_notice()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_absorb() {
        let mut total = CycleSummary { launches_found: 1, launch_alerts: 1, ..Default::default() };
        total.absorb(CycleSummary { launches_found: 2, pump_alerts: 1, chains_failed: 1, ..Default::default() });
        assert_eq!(total.launches_found, 3);
        assert_eq!(total.launch_alerts, 1);
        assert_eq!(total.pump_alerts, 1);
        assert_eq!(total.chains_failed, 1);

        total.absorb(CycleSummary { exits_fired: 2, exit_alerts: 1, ..Default::default() });
        assert_eq!(total.exits_fired, 2);
        assert_eq!(total.exit_alerts, 1);
    }

    #[test]
    fn test_stats_record_cycle() {
        let stats = HunterStats::default();
        stats.record_cycle(&CycleSummary { launch_alerts: 2, exit_alerts: 1, ..Default::default() });
        stats.record_cycle(&CycleSummary::default());
        assert_eq!(stats.cycles_completed(), 2);
        assert_eq!(stats.launch_alerts(), 2);
        assert_eq!(stats.exit_alerts(), 1);
    }
}
