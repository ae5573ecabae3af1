//! Hunter module - new-launch scanning, scoring and exit alerts.
//!
//! The scoring and pump detection functions are pure; the position tracker
//! owns the watched positions; `DegenHunter` drives periodic cycles against
//! pluggable data, alert and storage backends.

pub mod types;
pub mod error;
pub mod config;
pub mod scorer;
pub mod pump_detector;
pub mod position_tracker;
pub mod rate_limit;
pub mod data_sources;
pub mod alerts;
pub mod formatter;
pub mod storage;
pub mod monitor;

pub use alerts::{AlertSink, TelegramSink};
pub use data_sources::{DexScreenerSource, SnapshotSource};
pub use error::{ConfigError, DeliveryError, LookupError, TrackerError};
pub use monitor::{CycleSummary, DegenHunter, HunterStats, PositionSweep};
pub use position_tracker::{PositionTracker, SharedTracker};
pub use storage::{HunterStorage, SqliteLedger};
pub use types::{
    ExitEvent, ExitKind, Factor, FactorScores, HunterConfig, PotentialTier, ScoreResult,
    TrackedPosition,
};

use nonempty::NonEmpty;

/// Builder for [`HunterConfig`] starting from the defaults.
pub struct HunterConfigBuilder {
    config: HunterConfig,
}

impl HunterConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: HunterConfig::default(),
        }
    }

    /// Set Telegram credentials.
    pub fn with_telegram(mut self, bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        self.config.telegram_bot_token = bot_token.into();
        self.config.telegram_chat_id = chat_id.into();
        self
    }

    pub fn with_min_degen_score(mut self, score: u8) -> Self {
        self.config.min_degen_score = score;
        self
    }

    pub fn with_chains(mut self, chains: NonEmpty<String>) -> Self {
        self.config.chains = chains;
        self
    }

    pub fn with_scan_interval(mut self, seconds: u64) -> Self {
        self.config.scan_interval_seconds = seconds;
        self
    }

    /// Set default stop-loss / take-profit percentages.
    pub fn with_default_thresholds(mut self, stop_loss_pct: f64, take_profit_pct: f64) -> Self {
        self.config.default_stop_loss_pct = stop_loss_pct;
        self.config.default_take_profit_pct = take_profit_pct;
        self
    }

    pub fn with_db_path(mut self, path: impl Into<String>) -> Self {
        self.config.db_path = path.into();
        self
    }

    pub fn with_alert_cooldown(mut self, seconds: u64) -> Self {
        self.config.alert_cooldown_seconds = seconds;
        self
    }

    /// Set DexScreener endpoint and request budget.
    pub fn with_dexscreener(mut self, base_url: impl Into<String>, requests_per_minute: u32) -> Self {
        self.config.dexscreener_base_url = base_url.into();
        self.config.requests_per_minute = requests_per_minute;
        self
    }

    /// Build without validation.
    pub fn build_config(self) -> HunterConfig {
        self.config
    }

    pub fn build(self) -> Result<HunterConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for HunterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
