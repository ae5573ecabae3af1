//! In-process supervision of the monitoring loop.

use crate::control::commands::{self, Command};
use crate::hunter::error::TrackerError;
use crate::hunter::formatter::escape_html;
use crate::hunter::monitor::DegenHunter;
use crate::hunter::types::TrackedPosition;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("hunter is already running")]
    AlreadyRunning,
    #[error("hunter is not running")]
    NotRunning,
    #[error("hunter task ended abnormally: {0}")]
    TaskFailed(String),
}

/// Point-in-time view for the status command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorStatus {
    pub running: bool,
    pub uptime: Option<Duration>,
    pub cycles_completed: u64,
    pub tracked_positions: usize,
}

struct RunningHunter {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    started_at: Instant,
}

/// Owns at most one running monitoring task.
pub struct Supervisor {
    hunter: Arc<DegenHunter>,
    running: Option<RunningHunter>,
}

/// `2d 3h 15m`, with zero parts omitted and `<1m` below one minute.
pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() {
        "<1m".to_string()
    } else {
        parts.join(" ")
    }
}

impl Supervisor {
    pub fn new(hunter: Arc<DegenHunter>) -> Self {
        Self { hunter, running: None }
    }

    pub fn hunter(&self) -> &Arc<DegenHunter> {
        &self.hunter
    }

    /// A task that finished on its own no longer counts as running.
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }

    pub fn start(&mut self) -> Result<(), SupervisorError> {
        if self.is_running() {
            return Err(SupervisorError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let hunter = self.hunter.clone();
        let handle = tokio::spawn(async move {
            hunter.run(stop_rx).await;
        });

        self.running = Some(RunningHunter {
            stop_tx,
            handle,
            started_at: Instant::now(),
        });
        info!("Hunter task started");
        Ok(())
    }

    /// Signal stop and wait for the current cycle to finish.
    pub async fn stop(&mut self) -> Result<(), SupervisorError> {
        let running = match self.running.take() {
            Some(running) if !running.handle.is_finished() => running,
            _ => return Err(SupervisorError::NotRunning),
        };

        // Receiver may already be gone if the task exited; the join below
        // reports that case.
        let _ = running.stop_tx.send(true);
        running.handle.await.map_err(|e| {
            error!("Hunter task failed: {}", e);
            SupervisorError::TaskFailed(e.to_string())
        })?;

        info!("Hunter task stopped");
        Ok(())
    }

    /// Stop if running, then start.
    pub async fn restart(&mut self) -> Result<(), SupervisorError> {
        match self.stop().await {
            Ok(()) | Err(SupervisorError::NotRunning) => {}
            Err(e) => return Err(e),
        }
        self.start()
    }

    pub async fn status(&self) -> SupervisorStatus {
        let running = self.is_running();
        SupervisorStatus {
            running,
            uptime: self
                .running
                .as_ref()
                .filter(|_| running)
                .map(|r| r.started_at.elapsed()),
            cycles_completed: self.hunter.stats().cycles_completed(),
            tracked_positions: self.hunter.tracker().lock().await.len(),
        }
    }

    /// Track with the configured default thresholds where omitted.
    pub async fn track(
        &self,
        address: &str,
        symbol: &str,
        entry_price: f64,
        stop_loss_pct: Option<f64>,
        take_profit_pct: Option<f64>,
    ) -> Result<Option<TrackedPosition>, TrackerError> {
        let config = self.hunter.config();
        let stop_loss_pct = stop_loss_pct.unwrap_or(config.default_stop_loss_pct);
        let take_profit_pct = take_profit_pct.unwrap_or(config.default_take_profit_pct);

        self.hunter
            .tracker()
            .lock()
            .await
            .start_tracking(address, symbol, entry_price, stop_loss_pct, take_profit_pct)
    }

    pub async fn untrack(&self, address: &str) -> Option<TrackedPosition> {
        self.hunter.tracker().lock().await.stop_tracking(address)
    }

    /// Tracked positions, oldest first.
    pub async fn positions(&self) -> Vec<TrackedPosition> {
        let mut positions: Vec<TrackedPosition> =
            self.hunter.tracker().lock().await.positions().cloned().collect();
        positions.sort_by_key(|p| p.tracked_since);
        positions
    }

    /// Execute a command and render the chat reply.
    pub async fn handle(&mut self, command: Command) -> String {
        match command {
            Command::Start => match self.start() {
                Ok(()) => "✅ <b>Degen hunter started</b>".to_string(),
                Err(e) => format!("⚠️ {}", e),
            },
            Command::Stop => match self.stop().await {
                Ok(()) => "🛑 <b>Degen hunter stopped</b>".to_string(),
                Err(e) => format!("⚠️ {}", e),
            },
            Command::Restart => match self.restart().await {
                Ok(()) => "🔄 <b>Degen hunter restarted</b>".to_string(),
                Err(e) => format!("❌ Restart failed: {}", e),
            },
            Command::Status => render_status(&self.status().await),
            Command::Config => commands::config_text(self.hunter.config()),
            Command::Help => commands::help_text(),
            Command::Track {
                address,
                symbol,
                entry_price,
                stop_loss_pct,
                take_profit_pct,
            } => {
                match self
                    .track(&address, &symbol, entry_price, stop_loss_pct, take_profit_pct)
                    .await
                {
                    Ok(previous) => {
                        let mut reply = String::new();
                        let _ = write!(reply, "✓ Tracking ${}", escape_html(&symbol));
                        if let Some(position) = self.hunter.tracker().lock().await.get(&address) {
                            let _ = write!(
                                reply,
                                "\nEntry ${:.8}, SL ${:.8}, TP ${:.8}",
                                position.entry_price, position.stop_loss, position.take_profit
                            );
                        }
                        if previous.is_some() {
                            reply.push_str("\n(replaced previous thresholds)");
                        }
                        reply
                    }
                    Err(e) => format!("❌ {}", escape_html(&e.to_string())),
                }
            }
            Command::Untrack { address } => match self.untrack(&address).await {
                Some(position) => format!("✓ Stopped tracking ${}", escape_html(&position.symbol)),
                None => format!("⚠️ {} is not tracked", escape_html(&address)),
            },
            Command::Positions => render_positions(&self.positions().await),
            Command::Malformed { usage, reason } => {
                format!("❌ {}\nUsage: {}", escape_html(&reason), escape_html(usage))
            }
            Command::Unknown => commands::unknown_text(),
        }
    }
}

pub fn render_status(status: &SupervisorStatus) -> String {
    let mut msg = if status.running {
        let uptime = status.uptime.map(format_uptime).unwrap_or_else(|| "<1m".to_string());
        format!(
            "🟢 <b>Hunter Status: RUNNING</b>\n\n⏱️ Uptime: {}",
            escape_html(&uptime)
        )
    } else {
        "🔴 <b>Hunter Status: STOPPED</b>".to_string()
    };
    let _ = write!(
        msg,
        "\n🔁 Cycles completed: {}\n📌 Tracked positions: {}",
        status.cycles_completed, status.tracked_positions
    );
    msg
}

fn render_positions(positions: &[TrackedPosition]) -> String {
    if positions.is_empty() {
        return "No tracked positions.".to_string();
    }
    let mut msg = format!("📌 <b>Tracked Positions ({})</b>\n", positions.len());
    for p in positions {
        let _ = write!(
            msg,
            "\n• ${} <code>{}</code>\n  Entry ${:.8} | SL ${:.8} | TP ${:.8}",
            escape_html(&p.symbol),
            escape_html(&p.address),
            p.entry_price,
            p.stop_loss,
            p.take_profit
        );
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "<1m");
        assert_eq!(format_uptime(Duration::from_secs(59)), "<1m");
        assert_eq!(format_uptime(Duration::from_secs(60)), "1m");
        assert_eq!(format_uptime(Duration::from_secs(3_600 + 120)), "1h 2m");
        assert_eq!(format_uptime(Duration::from_secs(2 * 86_400 + 3 * 3_600 + 15 * 60)), "2d 3h 15m");
        assert_eq!(format_uptime(Duration::from_secs(86_400)), "1d");
    }

    #[test]
    fn test_render_status() {
        let running = SupervisorStatus {
            running: true,
            uptime: Some(Duration::from_secs(3_660)),
            cycles_completed: 12,
            tracked_positions: 2,
        };
        let text = render_status(&running);
        assert!(text.contains("RUNNING"));
        assert!(text.contains("Uptime: 1h 1m"));
        assert!(text.contains("Cycles completed: 12"));
        assert!(text.contains("Tracked positions: 2"));

        let stopped = SupervisorStatus { running: false, uptime: None, ..running };
        let text = render_status(&stopped);
        assert!(text.contains("STOPPED"));
        assert!(!text.contains("Uptime"));
    }

    #[test]
    fn test_render_positions() {
        assert_eq!(render_positions(&[]), "No tracked positions.");
        let position = TrackedPosition {
            address: "0xabc".to_string(),
            symbol: "X".to_string(),
            entry_price: 1.0,
            stop_loss: 0.8,
            take_profit: 2.0,
            tracked_since: 0,
        };
        let text = render_positions(&[position]);
        assert!(text.contains("Tracked Positions (1)"));
        assert!(text.contains("<code>0xabc</code>"));
    }
}
