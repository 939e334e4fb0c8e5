// src/services/notifier.rs

//! Notification delivery.
//!
//! `TelegramNotifier` talks to the Bot API. `LogNotifier` backs dry runs.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Credentials;
use crate::error::{NotifyError, Result};
use crate::models::TelegramConfig;
use crate::utils::http::create_api_client;

/// Something that can deliver a text message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> std::result::Result<(), NotifyError>;
}

/// `sendMessage` request body.
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// Sends messages to a Telegram chat.
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, credentials: &Credentials) -> Result<Self> {
        Ok(Self {
            client: create_api_client(config.timeout_secs)?,
            endpoint: send_message_url(&config.api_base, &credentials.bot_token),
            chat_id: credentials.chat_id.clone(),
        })
    }
}

fn send_message_url(api_base: &str, bot_token: &str) -> String {
    format!(
        "{}/bot{}/sendMessage",
        api_base.trim_end_matches('/'),
        bot_token
    )
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> std::result::Result<(), NotifyError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        // reqwest errors embed the URL, which contains the token.
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> std::result::Result<(), NotifyError> {
        log::info!("[dry-run] would send: {}", message.replace('\n', " | "));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_url() {
        assert_eq!(
            send_message_url("https://api.telegram.org/", "123:abc"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_payload_shape() {
        let payload = SendMessage {
            chat_id: "42",
            text: "hi",
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "chat_id": "42",
                "text": "hi",
                "parse_mode": "HTML",
                "disable_web_page_preview": true
            })
        );
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        assert!(LogNotifier.notify("line1\nline2").await.is_ok());
    }
}
