//! Remote control of the hunter over Telegram.
//!
//! Commands are parsed from chat text, executed against a `Supervisor` that
//! owns the monitoring task, and answered through the alert sink.

pub mod commands;
pub mod supervisor;
pub mod telegram;

pub use commands::Command;
pub use supervisor::{format_uptime, Supervisor, SupervisorError, SupervisorStatus};
pub use telegram::ControlBot;
