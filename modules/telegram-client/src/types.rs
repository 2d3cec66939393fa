//! Bot API payload types, limited to the fields the bot actually reads.

use serde::{Deserialize, Serialize};

/// One long-poll update. Only message updates are requested, so everything
/// else deserializes with `message: None` and is ignored upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Outgoing `sendMessage` payload.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboardMarkup>,
}

impl OutgoingMessage {
    /// Markdown message with link previews suppressed.
    pub fn markdown(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: Some("Markdown".to_string()),
            disable_web_page_preview: Some(true),
            reply_markup: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: ReplyKeyboardMarkup) -> Self {
        self.reply_markup = Some(keyboard);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
    pub one_time_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    /// Persistent keyboard built from rows of button labels.
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self {
            keyboard: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|label| KeyboardButton {
                            text: label.to_string(),
                        })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
            one_time_keyboard: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

/// Entry in the bot command menu (`setMyCommands`).
#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}
