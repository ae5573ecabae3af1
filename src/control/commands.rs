//! Text commands accepted by the control bot.

use crate::hunter::formatter::{escape_html, format_interval};
use crate::hunter::types::HunterConfig;
use std::fmt::Write;

pub const TRACK_USAGE: &str = "/track <address> <symbol> <entry_price> [stop_loss_%] [take_profit_%]";
pub const UNTRACK_USAGE: &str = "/untrack <address>";

/// A parsed control message.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Restart,
    Status,
    Config,
    Help,
    Track {
        address: String,
        symbol: String,
        entry_price: f64,
        stop_loss_pct: Option<f64>,
        take_profit_pct: Option<f64>,
    },
    Untrack {
        address: String,
    },
    Positions,
    /// Known command with unusable arguments
    Malformed {
        usage: &'static str,
        reason: String,
    },
    Unknown,
}

fn parse_number(raw: &str, what: &str) -> Result<f64, String> {
    raw.trim_end_matches('%')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{} '{}' is not a number", what, raw))
}

fn parse_track(args: &[&str]) -> Command {
    let malformed = |reason: String| Command::Malformed { usage: TRACK_USAGE, reason };

    if args.len() < 3 || args.len() > 5 {
        return malformed(format!("expected 3 to 5 arguments, got {}", args.len()));
    }
    let entry_price = match parse_number(args[2], "entry price") {
        Ok(v) => v,
        Err(reason) => return malformed(reason),
    };
    let stop_loss_pct = match args.get(3).map(|a| parse_number(a, "stop loss")).transpose() {
        Ok(v) => v,
        Err(reason) => return malformed(reason),
    };
    let take_profit_pct = match args.get(4).map(|a| parse_number(a, "take profit")).transpose() {
        Ok(v) => v,
        Err(reason) => return malformed(reason),
    };

    Command::Track {
        address: args[0].to_string(),
        symbol: args[1].to_string(),
        entry_price,
        stop_loss_pct,
        take_profit_pct,
    }
}

impl Command {
    /// Parse a chat message. The command word is case-insensitive, the
    /// leading slash and any `@botname` suffix are optional.
    pub fn parse(text: &str) -> Command {
        let mut words = text.split_whitespace();
        let Some(head) = words.next() else {
            return Command::Unknown;
        };
        let args: Vec<&str> = words.collect();

        let lowered = head.to_lowercase();
        let word = lowered.strip_prefix('/').unwrap_or(lowered.as_str());
        let name = word.split('@').next().unwrap_or(word);

        match (name, args.len()) {
            ("start", 0) => Command::Start,
            ("stop", 0) => Command::Stop,
            ("restart", 0) => Command::Restart,
            ("status", 0) => Command::Status,
            ("config", 0) => Command::Config,
            ("help", 0) => Command::Help,
            ("positions", 0) => Command::Positions,
            ("track", _) => parse_track(&args),
            ("untrack", 1) => Command::Untrack { address: args[0].to_string() },
            ("untrack", n) => Command::Malformed {
                usage: UNTRACK_USAGE,
                reason: format!("expected 1 argument, got {}", n),
            },
            _ => Command::Unknown,
        }
    }
}

pub fn help_text() -> String {
    let mut msg = String::new();
    msg.push_str("🤖 <b>Degen Hunter Control - Commands</b>\n\n");
    msg.push_str("<b>Hunter Control:</b>\n");
    msg.push_str("/start - Start the hunter\n");
    msg.push_str("/stop - Stop the hunter\n");
    msg.push_str("/restart - Restart the hunter\n");
    msg.push_str("/status - Check hunter status\n\n");
    msg.push_str("<b>Positions:</b>\n");
    let _ = writeln!(msg, "{}", escape_html(TRACK_USAGE));
    let _ = writeln!(msg, "{}", escape_html(UNTRACK_USAGE));
    msg.push_str("/positions - List tracked positions\n\n");
    msg.push_str("<b>Information:</b>\n");
    msg.push_str("/config - View configuration\n");
    msg.push_str("/help - Show this help\n\n");
    msg.push_str("Plain words work too: start, stop, status, restart.");
    msg
}

pub fn config_text(config: &HunterConfig) -> String {
    let chains: Vec<&str> = config.chains.iter().map(String::as_str).collect();

    let mut msg = String::new();
    msg.push_str("⚙️ <b>Current Configuration</b>\n\n");
    msg.push_str("<b>Degen Settings:</b>\n");
    let _ = writeln!(msg, "• Check Interval: {}", format_interval(config.scan_interval_seconds));
    let _ = writeln!(msg, "• Min Degen Score: {}", config.min_degen_score);
    let _ = writeln!(msg, "• Chains: {}", escape_html(&chains.join(", ")));
    let _ = writeln!(msg, "• Max Pair Age: {}h", config.max_pair_age_hours);
    let _ = writeln!(msg, "• Alert Cooldown: {}", format_interval(config.alert_cooldown_seconds));
    msg.push('\n');
    msg.push_str("<b>Price Alerts:</b>\n");
    let _ = writeln!(msg, "• Stop Loss: {}%", config.default_stop_loss_pct);
    let _ = write!(msg, "• Take Profit: {}%", config.default_take_profit_pct);
    msg
}

pub fn unknown_text() -> String {
    "❌ Unknown command. Send /help for available commands.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_control_words() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("  STOP "), Command::Stop);
        assert_eq!(Command::parse("Restart"), Command::Restart);
        assert_eq!(Command::parse("/status@degen_bot"), Command::Status);
        assert_eq!(Command::parse("config"), Command::Config);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("/positions"), Command::Positions);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Command::parse(""), Command::Unknown);
        assert_eq!(Command::parse("hello there"), Command::Unknown);
        assert_eq!(Command::parse("/start now"), Command::Unknown);
    }

    #[test]
    fn test_parse_track_with_defaults() {
        assert_eq!(
            Command::parse("/track 0xAbC PEPE 0.0001"),
            Command::Track {
                address: "0xAbC".to_string(),
                symbol: "PEPE".to_string(),
                entry_price: 0.0001,
                stop_loss_pct: None,
                take_profit_pct: None,
            }
        );
    }

    #[test]
    fn test_parse_track_with_thresholds() {
        assert_eq!(
            Command::parse("track 0xabc X 1.5 -10% 50"),
            Command::Track {
                address: "0xabc".to_string(),
                symbol: "X".to_string(),
                entry_price: 1.5,
                stop_loss_pct: Some(-10.0),
                take_profit_pct: Some(50.0),
            }
        );
    }

    #[test]
    fn test_parse_track_malformed() {
        assert!(matches!(
            Command::parse("/track 0xabc X"),
            Command::Malformed { usage: TRACK_USAGE, .. }
        ));
        assert!(matches!(
            Command::parse("/track 0xabc X cheap"),
            Command::Malformed { usage: TRACK_USAGE, .. }
        ));
    }

    #[test]
    fn test_parse_untrack() {
        assert_eq!(
            Command::parse("/untrack 0xabc"),
            Command::Untrack { address: "0xabc".to_string() }
        );
        assert!(matches!(Command::parse("/untrack"), Command::Malformed { usage: UNTRACK_USAGE, .. }));
    }

    #[test]
    fn test_help_escapes_usage() {
        let help = help_text();
        assert!(help.contains("/track &lt;address&gt;"));
        assert!(help.contains("/status"));
    }

    #[test]
    fn test_config_text() {
        let text = config_text(&HunterConfig::default());
        assert!(text.contains("Min Degen Score: 50"));
        assert!(text.contains("ethereum, bsc, polygon"));
        assert!(text.contains("Stop Loss: -20%"));
        assert!(text.contains("Take Profit: 100%"));
        assert!(text.contains("Check Interval: 5 minutes"));
    }
}
