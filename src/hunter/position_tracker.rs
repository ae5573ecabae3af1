//! Stop-loss / take-profit tracking of open positions.
//!
//! The tracker exclusively owns the set of watched positions. A position is
//! created by `start_tracking`, advanced by price checks, and removed the
//! moment one of its thresholds is crossed, so each position fires at most
//! once. Stop-loss is evaluated before take-profit.

use crate::hunter::error::{LookupError, TrackerError};
use crate::hunter::types::{ExitEvent, ExitKind, TrackedPosition};
use crate::types::Address;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tracker shared between the monitoring cycle and the control bot.
pub type SharedTracker = Arc<Mutex<PositionTracker>>;

/// Set of positions watched for exit conditions, keyed by address.
#[derive(Debug, Default)]
pub struct PositionTracker {
    positions: HashMap<Address, TrackedPosition>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a new tracker for sharing across tasks.
    pub fn shared() -> SharedTracker {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Start watching `address`.
    ///
    /// Thresholds are `entry * (1 + pct / 100)`. Tracking an address that is
    /// already tracked replaces it; the discarded position is returned so the
    /// caller can report it. Percentages that would break
    /// `stop_loss < entry < take_profit` are rejected.
    pub fn start_tracking(
        &mut self,
        address: &str,
        symbol: &str,
        entry_price: f64,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Result<Option<TrackedPosition>, TrackerError> {
        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(TrackerError::InvalidEntryPrice(entry_price));
        }
        if !stop_loss_pct.is_finite() || stop_loss_pct >= 0.0 {
            return Err(TrackerError::InvalidStopLoss(stop_loss_pct));
        }
        if !take_profit_pct.is_finite() || take_profit_pct <= 0.0 {
            return Err(TrackerError::InvalidTakeProfit(take_profit_pct));
        }

        let position = TrackedPosition {
            address: address.to_string(),
            symbol: symbol.to_string(),
            entry_price,
            stop_loss: entry_price * (1.0 + stop_loss_pct / 100.0),
            take_profit: entry_price * (1.0 + take_profit_pct / 100.0),
            tracked_since: chrono::Utc::now().timestamp_millis(),
        };

        info!(
            "Tracking {}: entry ${:.8}, SL ${:.8}, TP ${:.8}",
            position.symbol, position.entry_price, position.stop_loss, position.take_profit
        );

        let previous = self.positions.insert(address.to_string(), position);
        if let Some(old) = &previous {
            warn!(
                "Re-tracking {} replaced previous thresholds (entry ${:.8}, SL ${:.8}, TP ${:.8})",
                old.symbol, old.entry_price, old.stop_loss, old.take_profit
            );
        }
        Ok(previous)
    }

    /// Stop watching `address` without emitting an event.
    pub fn stop_tracking(&mut self, address: &str) -> Option<TrackedPosition> {
        self.positions.remove(address)
    }

    /// Evaluate one price observation.
    ///
    /// Unknown addresses are a no-op. A crossed threshold removes the
    /// position and returns the exit event.
    pub fn check(&mut self, address: &str, current_price: f64) -> Option<ExitEvent> {
        let position = self.positions.get(address)?;

        let (kind, threshold_price) = if current_price <= position.stop_loss {
            (ExitKind::StopLoss, position.stop_loss)
        } else if current_price >= position.take_profit {
            (ExitKind::TakeProfit, position.take_profit)
        } else {
            debug!(
                "{} at ${:.8} within [{:.8}, {:.8}]",
                position.symbol, current_price, position.stop_loss, position.take_profit
            );
            return None;
        };

        let position = self.positions.remove(address)?;
        let pnl_percent = (current_price - position.entry_price) / position.entry_price * 100.0;

        info!("{} triggered for {} ({:+.2}%)", kind, position.symbol, pnl_percent);

        Some(ExitEvent {
            kind,
            address: position.address,
            symbol: position.symbol,
            entry_price: position.entry_price,
            current_price,
            threshold_price,
            pnl_percent,
        })
    }

    /// Check every tracked position against `lookup`.
    ///
    /// An address whose lookup fails is skipped and stays tracked unchanged.
    /// Event order across addresses is unspecified.
    pub fn sweep<F>(&mut self, mut lookup: F) -> Vec<ExitEvent>
    where
        F: FnMut(&str) -> Result<f64, LookupError>,
    {
        let addresses: Vec<Address> = self.positions.keys().cloned().collect();
        let mut events = Vec::new();

        for address in addresses {
            match lookup(&address) {
                Ok(price) => {
                    if let Some(event) = self.check(&address, price) {
                        events.push(event);
                    }
                }
                Err(e) => {
                    warn!("Skipping price check for {}: {}", address, e);
                }
            }
        }

        events
    }

    pub fn get(&self, address: &str) -> Option<&TrackedPosition> {
        self.positions.get(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.positions.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.positions.keys().cloned().collect()
    }

    pub fn positions(&self) -> impl Iterator<Item = &TrackedPosition> {
        self.positions.values()
    }
}
