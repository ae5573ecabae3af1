//! Core types and data structures for the hunter system.

use crate::types::Address;
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Scoring factors of the degen score.
/// Each factor contributes an independently capped number of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    /// Pool liquidity in USD
    Liquidity,
    /// 24h volume relative to liquidity
    VolumeRatio,
    /// Pair freshness
    Age,
    /// Holder count
    Holders,
    /// One hour price change
    Momentum,
    /// Transactions in the last five minutes
    Activity,
}

impl Factor {
    /// Returns the string representation of the factor for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Liquidity => "liquidity",
            Factor::VolumeRatio => "volume_ratio",
            Factor::Age => "age",
            Factor::Holders => "holders",
            Factor::Momentum => "momentum",
            Factor::Activity => "activity",
        }
    }

    /// Maximum points the factor can contribute.
    pub fn cap(&self) -> u8 {
        match self {
            Factor::Liquidity | Factor::VolumeRatio => 20,
            Factor::Age | Factor::Holders | Factor::Momentum | Factor::Activity => 15,
        }
    }

    /// Returns all factors.
    pub fn all() -> [Factor; 6] {
        [
            Factor::Liquidity,
            Factor::VolumeRatio,
            Factor::Age,
            Factor::Holders,
            Factor::Momentum,
            Factor::Activity,
        ]
    }
}

/// Per-factor points container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactorScores {
    points: [u8; 6],
}

impl FactorScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, factor: Factor, points: u8) {
        self.points[factor as usize] = points.min(factor.cap());
    }

    pub fn get(&self, factor: Factor) -> u8 {
        self.points[factor as usize]
    }

    /// Sum of all factors.
    pub fn total(&self) -> u32 {
        self.points.iter().map(|&p| p as u32).sum()
    }

    /// Convert to HashMap for logging and persistence.
    pub fn to_hashmap(&self) -> HashMap<String, u8> {
        Factor::all()
            .into_iter()
            .map(|f| (f.as_str().to_string(), self.get(f)))
            .collect()
    }
}

/// Qualitative band of a degen score, used in alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PotentialTier {
    VeryHigh,
    High,
    Moderate,
    Low,
}

impl PotentialTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => PotentialTier::VeryHigh,
            60..=79 => PotentialTier::High,
            40..=59 => PotentialTier::Moderate,
            _ => PotentialTier::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PotentialTier::VeryHigh => "VERY HIGH",
            PotentialTier::High => "HIGH",
            PotentialTier::Moderate => "MODERATE",
            PotentialTier::Low => "LOW",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            PotentialTier::VeryHigh => "🚀🚀🚀",
            PotentialTier::High => "🚀🚀",
            PotentialTier::Moderate => "🚀",
            PotentialTier::Low => "⚡",
        }
    }
}

/// Result of scoring one snapshot. Recomputed every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreResult {
    /// Degen score (0-100)
    pub score: u8,
    /// Whether the pair is pumping right now
    pub is_pumping: bool,
    /// Points per factor
    pub breakdown: FactorScores,
}

impl ScoreResult {
    pub fn tier(&self) -> PotentialTier {
        PotentialTier::from_score(self.score)
    }
}

/// A token being watched for stop-loss / take-profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedPosition {
    pub address: Address,
    pub symbol: String,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Unix timestamp (ms) when tracking started
    pub tracked_since: i64,
}

/// Which threshold fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitKind {
    #[serde(rename = "STOP_LOSS")]
    StopLoss,
    #[serde(rename = "TAKE_PROFIT")]
    TakeProfit,
}

impl ExitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitKind::StopLoss => "STOP_LOSS",
            ExitKind::TakeProfit => "TAKE_PROFIT",
        }
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted when a tracked position crosses one of its thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitEvent {
    pub kind: ExitKind,
    pub address: Address,
    pub symbol: String,
    pub entry_price: f64,
    pub current_price: f64,
    /// The crossed threshold price
    pub threshold_price: f64,
    /// Signed profit/loss in percent relative to entry
    pub pnl_percent: f64,
}

// --- Persisted records (advisory history, never authoritative state) ---

/// A launch that passed the alert policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub chain: String,
    pub dex: String,
    pub price_usd: f64,
    pub liquidity_usd: f64,
    pub score: u8,
    pub is_pumping: bool,
    pub seen_at: i64,
}

/// A detected pump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpRecord {
    pub address: Address,
    pub symbol: String,
    pub chain: String,
    pub price_change_5m: f64,
    pub price_change_1h: f64,
    pub volume_surge: f64,
    pub score: u8,
    pub seen_at: i64,
}

/// A fired stop-loss / take-profit alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlertRecord {
    pub address: Address,
    pub symbol: String,
    pub entry_price: f64,
    pub current_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub kind: ExitKind,
    pub pnl_percent: f64,
    pub triggered_at: i64,
}

/// Runtime configuration of the hunter.
#[derive(Debug, Clone)]
pub struct HunterConfig {
    /// Telegram bot token
    pub telegram_bot_token: String,
    /// Chat that receives alerts and is allowed to send commands
    pub telegram_chat_id: String,
    /// Telegram Bot API base URL
    pub telegram_api_base: String,
    /// Minimum degen score for a launch alert
    pub min_degen_score: u8,
    /// Chains scanned every cycle
    pub chains: NonEmpty<String>,
    /// Seconds between cycles
    pub scan_interval_seconds: u64,
    /// Default stop-loss percentage (negative)
    pub default_stop_loss_pct: f64,
    /// Default take-profit percentage (positive)
    pub default_take_profit_pct: f64,
    /// SQLite database file
    pub db_path: String,
    /// DexScreener API base URL
    pub dexscreener_base_url: String,
    /// Pairs inspected per chain and cycle
    pub max_pairs_per_chain: usize,
    /// Pairs older than this are ignored
    pub max_pair_age_hours: f64,
    /// Window during which the same launch is not alerted twice
    pub alert_cooldown_seconds: u64,
    /// DexScreener request budget
    pub requests_per_minute: u32,
    /// HTTP timeout in seconds
    pub http_timeout_seconds: u64,
    /// Fetch retry attempts
    pub retry_attempts: usize,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            telegram_api_base: "https://api.telegram.org".to_string(),
            min_degen_score: 50,
            chains: NonEmpty::from((
                "ethereum".to_string(),
                vec!["bsc".to_string(), "polygon".to_string()],
            )),
            scan_interval_seconds: 300,
            default_stop_loss_pct: -20.0,
            default_take_profit_pct: 100.0,
            db_path: "degen_tracker.db".to_string(),
            dexscreener_base_url: "https://api.dexscreener.com/latest/dex".to_string(),
            max_pairs_per_chain: 20,
            max_pair_age_hours: 48.0,
            alert_cooldown_seconds: 3600,
            requests_per_minute: 60,
            http_timeout_seconds: 15,
            retry_attempts: 3,
        }
    }
}
