//! Minimal Telegram Bot API client: long polling, plain and keyboard
//! messages, in-place edits and command menu registration.

pub mod error;
pub mod types;

pub use error::{Result, TelegramError};
pub use types::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

const API_BASE: &str = "https://api.telegram.org";

/// Every Bot API response arrives wrapped in this envelope.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(API_BASE, token)
    }

    /// Point the client at a different API host (test servers).
    pub fn with_base_url(base: &str, token: &str) -> Self {
        // Client timeout sits above the long-poll window so getUpdates can
        // idle out server-side instead of being cut off locally.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: format!("{base}/bot{token}"),
        }
    }

    /// Long-poll for message updates with ids at or above `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<Message> {
        self.call("sendMessage", message).await
    }

    /// Rewrite a previously sent message in place.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<Message> {
        self.call(
            "editMessageText",
            &json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "text": text,
                "parse_mode": "Markdown",
            }),
        )
        .await
    }

    /// Register the command menu shown by Telegram clients.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<bool> {
        self.call("setMyCommands", &json!({ "commands": commands }))
            .await
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let envelope: ApiEnvelope<T> = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or_default(),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        envelope.result.ok_or_else(|| TelegramError::Api {
            code: 0,
            description: "ok response with empty result".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_result_or_error() {
        let ok: ApiEnvelope<bool> =
            serde_json::from_str(r#"{"ok": true, "result": true}"#).unwrap();
        assert!(ok.ok);
        assert_eq!(ok.result, Some(true));

        let err: ApiEnvelope<bool> = serde_json::from_str(
            r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#,
        )
        .unwrap();
        assert!(!err.ok);
        assert_eq!(err.error_code, Some(401));
        assert_eq!(err.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn base_url_embeds_the_token() {
        let client = TelegramClient::with_base_url("https://api.test", "123:abc");
        assert_eq!(client.base_url, "https://api.test/bot123:abc");
    }
}
