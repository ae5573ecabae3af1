//! Shared fakes for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use degen_hunter::hunter::{
    AlertSink, DeliveryError, HunterConfig, HunterConfigBuilder, LookupError, SnapshotSource,
};
use degen_hunter::types::TokenSnapshot;
use nonempty::NonEmpty;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Source serving canned pairs per chain and prices per address.
#[derive(Default)]
pub struct FakeSource {
    pairs: Mutex<HashMap<String, Vec<TokenSnapshot>>>,
    failing_chains: Mutex<Vec<String>>,
    prices: Mutex<HashMap<String, f64>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pairs(&self, chain: &str, pairs: Vec<TokenSnapshot>) {
        self.pairs.lock().unwrap().insert(chain.to_string(), pairs);
    }

    pub fn fail_chain(&self, chain: &str) {
        self.failing_chains.lock().unwrap().push(chain.to_string());
    }

    pub fn set_price(&self, address: &str, price: f64) {
        self.prices.lock().unwrap().insert(address.to_string(), price);
    }
}

#[async_trait]
impl SnapshotSource for FakeSource {
    async fn fetch_recent_pairs(&self, chain: &str) -> Result<Vec<TokenSnapshot>, LookupError> {
        if self.failing_chains.lock().unwrap().iter().any(|c| c == chain) {
            return Err(LookupError::Status(503));
        }
        Ok(self.pairs.lock().unwrap().get(chain).cloned().unwrap_or_default())
    }

    async fn fetch_current_price(&self, address: &str) -> Result<f64, LookupError> {
        self.prices
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .ok_or_else(|| LookupError::NoPrice(address.to_string()))
    }
}

/// Sink that records every delivered message, or rejects them while
/// switched to rejecting.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    reject: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        let sink = Self::default();
        sink.set_rejecting(true);
        sink
    }

    pub fn set_rejecting(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages().iter().filter(|m| m.contains(needle)).count()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected(400));
        }
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

pub fn test_config() -> HunterConfig {
    HunterConfigBuilder::new()
        .with_telegram("123:abc", "42")
        .with_chains(NonEmpty::from(("ethereum".to_string(), vec!["bsc".to_string()])))
        .with_scan_interval(3600)
        .build()
        .expect("valid test config")
}

/// Scores 78 (20 + 20 + 15 + 0 + 8 + 15) without pumping.
pub fn hot_launch(address: &str) -> TokenSnapshot {
    TokenSnapshot {
        address: address.to_string(),
        name: "Hot Token".to_string(),
        symbol: "HOT".to_string(),
        chain: "ethereum".to_string(),
        dex: "uniswap".to_string(),
        price_usd: 0.001,
        liquidity_usd: 150_000.0,
        volume_24h: 2_000_000.0,
        age_hours: 0.5,
        price_change_1h: 30.0,
        txns_5m: 60,
        url: format!("https://dexscreener.com/ethereum/{}", address),
        ..TokenSnapshot::default()
    }
}

/// Scores 4 and is not pumping.
pub fn cold_launch(address: &str) -> TokenSnapshot {
    TokenSnapshot {
        address: address.to_string(),
        symbol: "COLD".to_string(),
        chain: "ethereum".to_string(),
        price_usd: 0.5,
        liquidity_usd: 1_000.0,
        age_hours: 40.0,
        ..TokenSnapshot::default()
    }
}
