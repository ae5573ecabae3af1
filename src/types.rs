//! Core types and data structures for the degen-hunter monitoring system.

use serde::{Deserialize, Serialize};

/// Pair or token address as reported by the market-data feed.
pub type Address = String;

/// Age reported for pairs whose creation time is unknown.
pub const UNKNOWN_AGE_HOURS: f64 = 999.0;

/// A point-in-time read of one trading pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    /// Pair address, unique per chain + pair
    pub address: Address,
    /// Base token name
    pub name: String,
    /// Base token symbol
    pub symbol: String,
    /// Chain identifier (e.g., "ethereum", "bsc")
    pub chain: String,
    /// DEX identifier (e.g., "uniswap")
    pub dex: String,
    /// Price in USD
    pub price_usd: f64,
    /// USD value locked in the pool
    pub liquidity_usd: f64,
    /// Trading volume over the last 24 hours in USD
    pub volume_24h: f64,
    /// Hours since the pair was created
    pub age_hours: f64,
    /// Number of holders, 0 when the feed does not report it
    pub holders: u64,
    /// Price change over the last 5 minutes, in percent
    pub price_change_5m: f64,
    /// Price change over the last hour, in percent
    pub price_change_1h: f64,
    /// Buys plus sells over the last 5 minutes
    pub txns_5m: u64,
    /// Last-hour volume relative to the 24h hourly average
    pub volume_surge: f64,
    /// Link to the pair page
    pub url: String,
}

impl Default for TokenSnapshot {
    fn default() -> Self {
        Self {
            address: String::new(),
            name: String::new(),
            symbol: String::new(),
            chain: String::new(),
            dex: String::new(),
            price_usd: 0.0,
            liquidity_usd: 0.0,
            volume_24h: 0.0,
            age_hours: UNKNOWN_AGE_HOURS,
            holders: 0,
            price_change_5m: 0.0,
            price_change_1h: 0.0,
            txns_5m: 0,
            volume_surge: 1.0,
            url: String::new(),
        }
    }
}
