//! Telegram front end: the long-poll loop and command handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use matchday_common::Config;
use matchday_pipeline::Updater;
use matchday_store::{RecordFilter, RecordStore};
use telegram_client::{
    BotCommand, Message, OutgoingMessage, ReplyKeyboardMarkup, TelegramClient, Update,
};

use crate::render;

const BTN_UPCOMING: &str = "📅 Upcoming matches";
const BTN_RESULTS: &str = "🏆 Latest results";
const BTN_WATCH: &str = "📺 Where to watch";

/// How many records a list command shows.
const LIST_LIMIT: u32 = 5;
/// Long-poll window passed to getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;
/// Pause before resuming after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Upcoming,
    Results,
    Watch,
    Update,
}

/// Map message text to a command: slash commands (with an optional @botname
/// suffix) or the exact keyboard labels.
fn command_for(text: &str) -> Option<Command> {
    let text = text.trim();

    if let Some(first) = text.split_whitespace().next() {
        let slash = first.split('@').next().unwrap_or(first);
        match slash {
            "/start" => return Some(Command::Start),
            "/upcoming" => return Some(Command::Upcoming),
            "/results" => return Some(Command::Results),
            "/watch" => return Some(Command::Watch),
            "/update" => return Some(Command::Update),
            _ => {}
        }
    }

    match text {
        BTN_UPCOMING => Some(Command::Upcoming),
        BTN_RESULTS => Some(Command::Results),
        BTN_WATCH => Some(Command::Watch),
        _ => None,
    }
}

pub struct Bot {
    client: TelegramClient,
    store: Arc<dyn RecordStore>,
    updater: Arc<Updater>,
    team_name: String,
    admin_chat_id: Option<i64>,
}

impl Bot {
    pub fn new(
        client: TelegramClient,
        store: Arc<dyn RecordStore>,
        updater: Arc<Updater>,
        config: &Config,
    ) -> Self {
        Self {
            client,
            store,
            updater,
            team_name: config.team_name.clone(),
            admin_chat_id: config.admin_chat_id,
        }
    }

    /// Register the command menu shown in Telegram clients.
    pub async fn register_commands(&self) -> Result<()> {
        let commands = [
            command("start", "Show the menu"),
            command("upcoming", "Upcoming matches"),
            command("results", "Latest results"),
            command("watch", "Where to watch"),
            command("update", "Force a data update (admin)"),
        ];
        self.client.set_my_commands(&commands).await?;
        Ok(())
    }

    /// Poll for updates forever. A failed poll is logged and retried after a
    /// short pause; a failed handler only skips that one update.
    pub async fn run(&self) {
        info!("Bot long-poll loop started");
        let mut offset = 0i64;

        loop {
            match self.client.get_updates(offset, POLL_TIMEOUT_SECS).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Err(e) = self.handle_update(&update).await {
                            warn!(
                                update_id = update.update_id,
                                error = %e,
                                "Failed to handle update"
                            );
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "Polling failed, resuming shortly");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    async fn handle_update(&self, update: &Update) -> Result<()> {
        let Some(message) = &update.message else {
            return Ok(());
        };
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let Some(cmd) = command_for(text) else {
            return Ok(());
        };

        debug!(chat_id = message.chat.id, ?cmd, "Handling command");
        match cmd {
            Command::Start => self.cmd_start(message).await,
            Command::Upcoming => self.cmd_upcoming(message).await,
            Command::Results => self.cmd_results(message).await,
            Command::Watch => self.cmd_watch(message).await,
            Command::Update => self.cmd_update(message).await,
        }
    }

    async fn cmd_start(&self, message: &Message) -> Result<()> {
        let first_name = message
            .from
            .as_ref()
            .map(|user| user.first_name.as_str())
            .unwrap_or("there");

        let keyboard =
            ReplyKeyboardMarkup::from_rows(&[&[BTN_UPCOMING, BTN_RESULTS], &[BTN_WATCH]]);
        let reply =
            OutgoingMessage::markdown(message.chat.id, render::greeting(&self.team_name, first_name))
                .with_keyboard(keyboard);

        self.client.send_message(&reply).await?;
        Ok(())
    }

    async fn cmd_upcoming(&self, message: &Message) -> Result<()> {
        let matches = self
            .store
            .query(RecordFilter::Upcoming { after: Utc::now() }, LIST_LIMIT)
            .await?;
        let text = render::upcoming_list(&self.team_name, &matches);
        self.client
            .send_message(&OutgoingMessage::markdown(message.chat.id, text))
            .await?;
        Ok(())
    }

    async fn cmd_results(&self, message: &Message) -> Result<()> {
        let matches = self.store.query(RecordFilter::Completed, LIST_LIMIT).await?;
        let text = render::results_list(&self.team_name, &matches);
        self.client
            .send_message(&OutgoingMessage::markdown(message.chat.id, text))
            .await?;
        Ok(())
    }

    async fn cmd_watch(&self, message: &Message) -> Result<()> {
        let matches = self
            .store
            .query(RecordFilter::Upcoming { after: Utc::now() }, LIST_LIMIT)
            .await?;
        let text = render::watch_list(&matches);
        self.client
            .send_message(&OutgoingMessage::markdown(message.chat.id, text))
            .await?;
        Ok(())
    }

    /// Admin-gated forced update. Sends a progress message first, then edits
    /// it in place with the outcome so the chat shows a single status line.
    async fn cmd_update(&self, message: &Message) -> Result<()> {
        if self.admin_chat_id != Some(message.chat.id) {
            info!(chat_id = message.chat.id, "Refused forced update for non-admin chat");
            self.client
                .send_message(&OutgoingMessage::markdown(
                    message.chat.id,
                    "Sorry, only the bot admin can force an update.",
                ))
                .await?;
            return Ok(());
        }

        let progress = self
            .client
            .send_message(&OutgoingMessage::markdown(
                message.chat.id,
                "🔄 Updating match data, hold on...",
            ))
            .await?;

        let status = match self.updater.force_update().await {
            Ok(changed) => format!("✅ Update finished: {changed} record(s) changed."),
            Err(e) => format!("⚠️ Update failed: {e}"),
        };
        self.client
            .edit_message_text(message.chat.id, progress.message_id, &status)
            .await?;
        Ok(())
    }
}

fn command(name: &str, description: &str) -> BotCommand {
    BotCommand {
        command: name.to_string(),
        description: description.to_string(),
    }
}
