//! degen-hunter - new DEX launch scanner with pump detection and SL/TP alerts
//!
//! This crate polls DexScreener for freshly created pairs, scores them with a
//! heuristic degen score, tracks positions against stop-loss / take-profit
//! thresholds and pushes alerts to Telegram. It is read-only: nothing here
//! places orders or touches a wallet.

pub mod types;
pub mod hunter;
pub mod control;

// Re-export main types for convenience
pub use types::{Address, TokenSnapshot};
