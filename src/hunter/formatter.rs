//! Telegram message rendering (HTML parse mode).

use crate::hunter::types::{ExitEvent, ExitKind, ScoreResult};
use crate::types::TokenSnapshot;
use std::fmt::Write;

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Round to whole dollars with thousands separators, e.g. `1,234,567`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = value.abs().round() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0.0 && rounded > 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn or_unknown(text: &str) -> &str {
    if text.is_empty() {
        "Unknown"
    } else {
        text
    }
}

fn symbol_or_placeholder(symbol: &str) -> &str {
    if symbol.is_empty() {
        "???"
    } else {
        symbol
    }
}

pub fn format_launch_alert(snapshot: &TokenSnapshot, result: &ScoreResult) -> String {
    let tier = result.tier();
    let pump_status = if result.is_pumping { " 🔥 PUMPING NOW!" } else { "" };

    let mut msg = String::new();
    let _ = writeln!(msg, "💎 <b>NEW DEGEN COIN ALERT</b> {}{}", tier.emoji(), pump_status);
    msg.push('\n');
    let _ = writeln!(
        msg,
        "<b>Token:</b> {} (${})",
        escape_html(or_unknown(&snapshot.name)),
        escape_html(symbol_or_placeholder(&snapshot.symbol))
    );
    let _ = writeln!(msg, "<b>Chain:</b> {}", escape_html(&or_unknown(&snapshot.chain).to_uppercase()));
    let _ = writeln!(msg, "<b>DEX:</b> {}", escape_html(&or_unknown(&snapshot.dex).to_uppercase()));
    msg.push('\n');
    let _ = writeln!(
        msg,
        "<b>🎯 DEGEN SCORE: {}/100 ({} POTENTIAL)</b>",
        result.score,
        tier.label()
    );
    msg.push('\n');
    let _ = writeln!(msg, "<b>💰 Stats:</b>");
    let _ = writeln!(msg, "• Price: ${:.10}", snapshot.price_usd);
    let _ = writeln!(msg, "• Liquidity: ${}", format_usd(snapshot.liquidity_usd));
    let _ = writeln!(msg, "• Volume 24h: ${}", format_usd(snapshot.volume_24h));
    let _ = writeln!(msg, "• Age: {:.1} hours", snapshot.age_hours);
    msg.push('\n');
    let _ = writeln!(msg, "<b>📊 Price Action:</b>");
    let _ = writeln!(msg, "• 5m: {:+.1}%", snapshot.price_change_5m);
    let _ = writeln!(msg, "• 1h: {:+.1}%", snapshot.price_change_1h);
    let _ = writeln!(msg, "• Txns (5m): {}", snapshot.txns_5m);
    msg.push('\n');
    let _ = writeln!(msg, "<b>🔗 Trade:</b>");
    let _ = writeln!(msg, "{}", escape_html(&snapshot.url));
    msg.push('\n');
    let _ = writeln!(msg, "<b>⚠️ DEGEN WARNING:</b>");
    msg.push_str("✅ Check contract on scanner\n");
    msg.push_str("✅ Verify liquidity locked\n");
    msg.push_str("✅ Check holder distribution\n");
    msg.push_str("✅ Use SMALL position size\n");
    msg.push_str("✅ Never invest more than you can lose\n\n");
    msg.push_str("<i>This is extremely high risk. Most degen coins go to zero.</i>");
    msg
}

pub fn format_pump_alert(snapshot: &TokenSnapshot) -> String {
    let mut msg = String::new();
    msg.push_str("🔥🔥🔥 <b>PUMP DETECTED!</b> 🔥🔥🔥\n\n");
    let _ = writeln!(msg, "<b>Token:</b> ${}", escape_html(symbol_or_placeholder(&snapshot.symbol)));
    let _ = writeln!(msg, "<b>Chain:</b> {}", escape_html(&or_unknown(&snapshot.chain).to_uppercase()));
    msg.push('\n');
    msg.push_str("<b>📈 PUMP METRICS:</b>\n");
    let _ = writeln!(msg, "• 5m: <b>{:+.1}%</b>", snapshot.price_change_5m);
    let _ = writeln!(msg, "• 1h: <b>{:+.1}%</b>", snapshot.price_change_1h);
    let _ = writeln!(msg, "• Volume Surge: <b>{:.1}x</b>", snapshot.volume_surge);
    msg.push('\n');
    let _ = writeln!(msg, "<b>💰 Current Price:</b> ${:.10}", snapshot.price_usd);
    msg.push('\n');
    let _ = writeln!(msg, "<b>🔗 Trade:</b>\n{}", escape_html(&snapshot.url));
    msg.push('\n');
    msg.push_str("<b>⚠️ PUMP WARNING:</b>\n");
    msg.push_str("• Pumps can dump INSTANTLY\n");
    msg.push_str("• Take profits on the way up\n");
    msg.push_str("• Use stop loss\n");
    msg.push_str("• High risk of rug pull");
    msg
}

pub fn format_exit_alert(event: &ExitEvent) -> String {
    let (emoji, title, advice) = match event.kind {
        ExitKind::StopLoss => ("🛑", "STOP LOSS TRIGGERED", "🛑 Consider selling to limit losses"),
        ExitKind::TakeProfit => ("✅", "TAKE PROFIT TRIGGERED", "✅ Consider taking profits"),
    };

    let mut msg = String::new();
    let _ = writeln!(msg, "{} <b>{}</b> {}", emoji, title, emoji);
    msg.push('\n');
    let _ = writeln!(msg, "<b>Token:</b> ${}", escape_html(symbol_or_placeholder(&event.symbol)));
    let _ = writeln!(msg, "<b>Address:</b> <code>{}</code>", escape_html(&event.address));
    msg.push('\n');
    msg.push_str("<b>📊 Trade Summary:</b>\n");
    let _ = writeln!(msg, "• Entry: ${:.10}", event.entry_price);
    let _ = writeln!(msg, "• Current: ${:.10}", event.current_price);
    let _ = writeln!(msg, "• Target: ${:.10}", event.threshold_price);
    msg.push('\n');
    let _ = writeln!(msg, "<b>💰 P/L: {:+.2}%</b>", event.pnl_percent);
    msg.push('\n');
    let _ = write!(msg, "<b>{}</b>", advice);
    msg
}

pub fn format_startup_notice(interval_seconds: u64, chains: &[String]) -> String {
    let mut msg = String::new();
    msg.push_str("💎 <b>Degen Coin Hunter Started!</b>\n\n");
    let _ = writeln!(msg, "✓ Monitoring every {}", format_interval(interval_seconds));
    let _ = writeln!(msg, "✓ Chains: {}", escape_html(&chains.join(", ")));
    msg.push_str("✓ Scanning: New launches & pumps\n");
    msg.push_str("✓ Tracking: Price alerts (SL/TP)\n\n");
    msg.push_str("⚠️ <b>HIGH RISK WARNING:</b>\n");
    msg.push_str("Degen coins are EXTREMELY risky!\n");
    msg.push_str("Only use money you can afford to lose!");
    msg
}

pub fn format_stop_notice() -> String {
    "🛑 <b>Degen Coin Hunter Stopped</b>".to_string()
}

/// `5 minutes`, `1 minute`, or `45 seconds` for sub-minute intervals.
pub fn format_interval(seconds: u64) -> String {
    match seconds {
        s if s % 60 != 0 => format!("{} seconds", s),
        60 => "1 minute".to_string(),
        s => format!("{} minutes", s / 60),
    }
}
