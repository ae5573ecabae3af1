//! Environment-driven configuration.
//!
//! Settings are read from the process environment (and a `.env` file when
//! present). Anything not set falls back to the defaults below; the Telegram
//! credentials are required.

use crate::hunter::error::ConfigError;
use crate::hunter::types::HunterConfig;
use nonempty::NonEmpty;
use serde::Deserialize;
use tracing::debug;

fn default_min_degen_score() -> u8 {
    50
}

fn default_chains() -> String {
    "ethereum,bsc,polygon".to_string()
}

fn default_check_interval() -> u64 {
    5
}

fn default_stop_loss() -> f64 {
    -20.0
}

fn default_take_profit() -> f64 {
    100.0
}

fn default_db_path() -> String {
    "degen_tracker.db".to_string()
}

fn default_max_pairs() -> usize {
    20
}

fn default_max_age_hours() -> f64 {
    48.0
}

fn default_cooldown_minutes() -> u64 {
    60
}

fn default_requests_per_minute() -> u32 {
    60
}

/// Flat view of the environment. Keys are the lowercased variable names.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    telegram_bot_token: Option<String>,
    #[serde(default)]
    telegram_chat_id: Option<String>,
    #[serde(default = "default_min_degen_score")]
    min_degen_score: u8,
    #[serde(default = "default_chains")]
    degen_chains: String,
    /// Minutes between cycles
    #[serde(default = "default_check_interval")]
    check_interval: u64,
    #[serde(default = "default_stop_loss")]
    default_stop_loss: f64,
    #[serde(default = "default_take_profit")]
    default_take_profit: f64,
    #[serde(default = "default_db_path")]
    degen_db_path: String,
    #[serde(default = "default_max_pairs")]
    max_pairs_per_chain: usize,
    #[serde(default = "default_max_age_hours")]
    max_pair_age_hours: f64,
    #[serde(default = "default_cooldown_minutes")]
    alert_cooldown_minutes: u64,
    #[serde(default = "default_requests_per_minute")]
    dexscreener_requests_per_minute: u32,
}

/// Split a comma separated chain list, dropping blanks.
pub fn parse_chains(raw: &str) -> Option<NonEmpty<String>> {
    let chains: Vec<String> = raw
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    NonEmpty::from_vec(chains)
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

impl HunterConfig {
    /// Load from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        let settings = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;
        Self::from_config(settings)
    }

    /// Build from an already assembled `config::Config`.
    pub fn from_config(settings: config::Config) -> Result<Self, ConfigError> {
        let raw: RawSettings = settings.try_deserialize()?;

        let chains = parse_chains(&raw.degen_chains).ok_or_else(|| ConfigError::Invalid {
            name: "DEGEN_CHAINS",
            reason: "at least one chain is required".to_string(),
        })?;

        let config = HunterConfig {
            telegram_bot_token: required(raw.telegram_bot_token, "TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: required(raw.telegram_chat_id, "TELEGRAM_CHAT_ID")?,
            min_degen_score: raw.min_degen_score,
            chains,
            scan_interval_seconds: raw.check_interval.saturating_mul(60),
            default_stop_loss_pct: raw.default_stop_loss,
            default_take_profit_pct: raw.default_take_profit,
            db_path: raw.degen_db_path,
            max_pairs_per_chain: raw.max_pairs_per_chain,
            max_pair_age_hours: raw.max_pair_age_hours,
            alert_cooldown_seconds: raw.alert_cooldown_minutes.saturating_mul(60),
            requests_per_minute: raw.dexscreener_requests_per_minute,
            ..HunterConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the hunter cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(ConfigError::Missing("TELEGRAM_BOT_TOKEN"));
        }
        if self.telegram_chat_id.trim().is_empty() {
            return Err(ConfigError::Missing("TELEGRAM_CHAT_ID"));
        }
        if self.min_degen_score > 100 {
            return Err(ConfigError::Invalid {
                name: "MIN_DEGEN_SCORE",
                reason: format!("{} exceeds the maximum score of 100", self.min_degen_score),
            });
        }
        if !self.default_stop_loss_pct.is_finite() || self.default_stop_loss_pct >= 0.0 {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_STOP_LOSS",
                reason: format!("must be negative, got {}", self.default_stop_loss_pct),
            });
        }
        if self.default_stop_loss_pct <= -100.0 {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_STOP_LOSS",
                reason: format!("must be above -100, got {}", self.default_stop_loss_pct),
            });
        }
        if !self.default_take_profit_pct.is_finite() || self.default_take_profit_pct <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_TAKE_PROFIT",
                reason: format!("must be positive, got {}", self.default_take_profit_pct),
            });
        }
        if self.scan_interval_seconds == 0 {
            return Err(ConfigError::Invalid {
                name: "CHECK_INTERVAL",
                reason: "must be at least one minute".to_string(),
            });
        }
        if self.max_pairs_per_chain == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_PAIRS_PER_CHAIN",
                reason: "must be positive".to_string(),
            });
        }
        if !self.max_pair_age_hours.is_finite() || self.max_pair_age_hours <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "MAX_PAIR_AGE_HOURS",
                reason: format!("must be positive, got {}", self.max_pair_age_hours),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> config::Config {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        builder.build().unwrap()
    }

    fn with_credentials(extra: &[(&str, &str)]) -> config::Config {
        let mut pairs = vec![("telegram_bot_token", "123:abc"), ("telegram_chat_id", "42")];
        pairs.extend_from_slice(extra);
        settings(&pairs)
    }

    #[test]
    fn test_defaults_applied() {
        let config = HunterConfig::from_config(with_credentials(&[])).unwrap();

        assert_eq!(config.telegram_bot_token, "123:abc");
        assert_eq!(config.telegram_chat_id, "42");
        assert_eq!(config.min_degen_score, 50);
        assert_eq!(config.scan_interval_seconds, 300);
        assert_eq!(config.default_stop_loss_pct, -20.0);
        assert_eq!(config.default_take_profit_pct, 100.0);
        assert_eq!(config.db_path, "degen_tracker.db");
        assert_eq!(config.alert_cooldown_seconds, 3600);
        let chains: Vec<&String> = config.chains.iter().collect();
        assert_eq!(chains, vec!["ethereum", "bsc", "polygon"]);
    }

    #[test]
    fn test_overrides_parsed() {
        let config = HunterConfig::from_config(with_credentials(&[
            ("min_degen_score", "70"),
            ("degen_chains", " Solana , base ,,"),
            ("check_interval", "2"),
            ("default_stop_loss", "-10"),
            ("default_take_profit", "250.5"),
            ("alert_cooldown_minutes", "15"),
        ]))
        .unwrap();

        assert_eq!(config.min_degen_score, 70);
        assert_eq!(config.chains.head, "solana");
        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.scan_interval_seconds, 120);
        assert_eq!(config.default_stop_loss_pct, -10.0);
        assert_eq!(config.default_take_profit_pct, 250.5);
        assert_eq!(config.alert_cooldown_seconds, 900);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = HunterConfig::from_config(settings(&[("telegram_chat_id", "42")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_BOT_TOKEN")));

        let err = HunterConfig::from_config(settings(&[("telegram_bot_token", "t")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_CHAT_ID")));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let err = HunterConfig::from_config(with_credentials(&[("default_stop_loss", "5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DEFAULT_STOP_LOSS", .. }));

        let err = HunterConfig::from_config(with_credentials(&[("default_take_profit", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DEFAULT_TAKE_PROFIT", .. }));
    }

    #[test]
    fn test_empty_chain_list_rejected() {
        let err = HunterConfig::from_config(with_credentials(&[("degen_chains", " , ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DEGEN_CHAINS", .. }));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = HunterConfig::from_config(with_credentials(&[("check_interval", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CHECK_INTERVAL", .. }));
    }

    #[test]
    fn test_default_config_needs_credentials() {
        assert!(HunterConfig::default().validate().is_err());
    }
}
