//! Alert delivery.

use crate::hunter::error::DeliveryError;
use crate::hunter::types::HunterConfig;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde_json::json;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, instrument};

/// Outbound channel for formatted alert messages.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, message: &str) -> Result<(), DeliveryError>;
}

/// Telegram Bot API `sendMessage` sink, one message per second.
pub struct TelegramSink {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    limiter: DefaultDirectRateLimiter,
    timeout: Duration,
}

impl TelegramSink {
    pub fn new(client: Client, config: &HunterConfig) -> Self {
        Self {
            client,
            api_base: config.telegram_api_base.trim_end_matches('/').to_string(),
            bot_token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
            limiter: RateLimiter::direct(Quota::per_second(NonZeroU32::MIN)),
            timeout: Duration::from_secs(config.http_timeout_seconds),
        }
    }

    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    pub fn payload(&self, message: &str) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        })
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    #[instrument(skip(self, message), fields(len = message.len()))]
    async fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        self.limiter.until_ready().await;

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(self.timeout)
            .json(&self.payload(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected(status.as_u16()));
        }
        debug!("Telegram accepted message");
        Ok(())
    }
}
