//! Telegram long-poll loop feeding commands to the supervisor.

use crate::control::commands::Command;
use crate::control::supervisor::Supervisor;
use crate::hunter::alerts::AlertSink;
use crate::hunter::error::LookupError;
use crate::hunter::types::HunterConfig;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Seconds Telegram holds a `getUpdates` request open.
const LONG_POLL_SECONDS: u64 = 30;
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct UpdatesResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Vec<Update>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Texts from the authorized chat plus the offset for the next poll.
///
/// Updates from any other chat are acknowledged but dropped.
pub fn authorized_texts(updates: &[Update], chat_id: &str, offset: i64) -> (i64, Vec<String>) {
    let mut next_offset = offset;
    let mut texts = Vec::new();

    for update in updates {
        next_offset = next_offset.max(update.update_id + 1);
        let Some(message) = &update.message else {
            continue;
        };
        if message.chat.id.to_string() != chat_id.trim() {
            debug!("Ignoring message from unauthorized chat {}", message.chat.id);
            continue;
        }
        if let Some(text) = message.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            texts.push(text.to_string());
        }
    }

    (next_offset, texts)
}

pub struct ControlBot {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    sink: Arc<dyn AlertSink>,
    supervisor: Supervisor,
    offset: i64,
}

impl ControlBot {
    pub fn new(
        client: Client,
        config: &HunterConfig,
        sink: Arc<dyn AlertSink>,
        supervisor: Supervisor,
    ) -> Self {
        Self {
            client,
            api_base: config.telegram_api_base.trim_end_matches('/').to_string(),
            bot_token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
            sink,
            supervisor,
            offset: 0,
        }
    }

    pub fn supervisor_mut(&mut self) -> &mut Supervisor {
        &mut self.supervisor
    }

    #[instrument(skip(self))]
    async fn get_updates(&self) -> Result<Vec<Update>, LookupError> {
        let url = format!("{}/bot{}/getUpdates", self.api_base, self.bot_token);
        let response = self
            .client
            .get(url)
            .query(&[("offset", self.offset), ("timeout", LONG_POLL_SECONDS as i64)])
            .timeout(Duration::from_secs(LONG_POLL_SECONDS + 5))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        let body: UpdatesResponse = response.json().await?;
        if !body.ok {
            return Err(LookupError::Unavailable(
                body.description.unwrap_or_else(|| "getUpdates returned ok=false".to_string()),
            ));
        }
        Ok(body.result)
    }

    async fn reply(&self, text: &str) {
        if let Err(e) = self.sink.deliver(text).await {
            warn!("Failed to send control reply: {}", e);
        }
    }

    /// Handle one authorized message and send the reply.
    pub async fn handle_text(&mut self, text: &str) -> String {
        info!("Received command: {}", text);
        let response = self.supervisor.handle(Command::parse(text)).await;
        self.reply(&response).await;
        response
    }

    /// Poll until `shutdown` fires, then stop the hunter if it is running.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        self.reply(
            "🤖 <b>Degen Hunter Control Bot Started!</b>\n\nSend /help to see available commands.",
        )
        .await;
        info!("Control bot polling for commands");

        loop {
            let updates = tokio::select! {
                result = self.get_updates() => result,
                _ = shutdown.changed() => break,
            };

            match updates {
                Ok(updates) => {
                    let (next_offset, texts) = authorized_texts(&updates, &self.chat_id, self.offset);
                    self.offset = next_offset;
                    for text in texts {
                        self.handle_text(&text).await;
                    }
                }
                Err(e) => {
                    warn!("getUpdates failed: {}", e);
                    tokio::select! {
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                        _ = shutdown.changed() => break,
                    }
                }
            }
        }

        if self.supervisor.is_running() {
            if let Err(e) = self.supervisor.stop().await {
                warn!("Failed to stop hunter during shutdown: {}", e);
            }
        }
        self.reply("🛑 <b>Control Bot Stopped</b>").await;
        info!("Control bot stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updates() -> Vec<Update> {
        let body = serde_json::json!({
            "ok": true,
            "result": [
                { "update_id": 10, "message": { "message_id": 1, "chat": { "id": 42, "type": "private" }, "text": "/status" } },
                { "update_id": 11, "message": { "message_id": 2, "chat": { "id": 99, "type": "private" }, "text": "/stop" } },
                { "update_id": 12, "edited_message": { "message_id": 3, "chat": { "id": 42 } } },
                { "update_id": 13, "message": { "message_id": 4, "chat": { "id": 42 }, "sticker": {} } },
                { "update_id": 14, "message": { "message_id": 5, "chat": { "id": 42 }, "text": "  help " } }
            ]
        });
        let response: UpdatesResponse = serde_json::from_value(body).unwrap();
        assert!(response.ok);
        response.result
    }

    #[test]
    fn test_only_authorized_chat_is_handled() {
        let (offset, texts) = authorized_texts(&updates(), "42", 0);
        assert_eq!(offset, 15);
        assert_eq!(texts, vec!["/status".to_string(), "help".to_string()]);
    }

    #[test]
    fn test_offset_never_moves_backwards() {
        let (offset, texts) = authorized_texts(&[], "42", 20);
        assert_eq!(offset, 20);
        assert!(texts.is_empty());
    }

    #[test]
    fn test_error_response_parses() {
        let body = r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;
        let response: UpdatesResponse = serde_json::from_str(body).unwrap();
        assert!(!response.ok);
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
        assert!(response.result.is_empty());
    }
}
