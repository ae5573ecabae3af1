//! Typed failures of the individual hunter operations.
//!
//! Lookup and delivery failures are transient: the affected unit of work is
//! skipped and retried on the next cycle. Configuration and tracker errors are
//! rejected up front.

use thiserror::Error;

/// Failure to obtain market data for one chain or one address.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("no usable price for {0}")]
    NoPrice(String),
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("price for {0} was not fetched this cycle")]
    NotFetched(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LookupError::Parse(e.to_string())
        } else if let Some(status) = e.status() {
            LookupError::Status(status.as_u16())
        } else {
            LookupError::Unavailable(e.to_string())
        }
    }
}

/// Failure to hand a message to the alert channel.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("alert channel unreachable: {0}")]
    Unreachable(String),
    #[error("alert channel rejected message with status {0}")]
    Rejected(u16),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => DeliveryError::Rejected(status.as_u16()),
            None => DeliveryError::Unreachable(e.to_string()),
        }
    }
}

/// Rejected `start_tracking` input.
#[derive(Debug, Error, PartialEq)]
pub enum TrackerError {
    #[error("entry price must be positive and finite, got {0}")]
    InvalidEntryPrice(f64),
    #[error("stop-loss percentage must be negative, got {0}")]
    InvalidStopLoss(f64),
    #[error("take-profit percentage must be positive, got {0}")]
    InvalidTakeProfit(f64),
}

/// Invalid or missing configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error(transparent)]
    Source(#[from] config::ConfigError),
}
