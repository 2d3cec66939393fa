//! Matchday bot entry point: configuration, store, update schedule and the
//! Telegram loop.

mod bot;
mod render;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use matchday_common::Config;
use matchday_pipeline::{schedule, FetchConfig, Fetcher, HttpTransport, Synchronizer, Updater};
use matchday_store::{RecordStore, SqliteStore};
use telegram_client::TelegramClient;

use bot::Bot;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("matchday_bot=info".parse()?)
                .add_directive("matchday_pipeline=info".parse()?)
                .add_directive("matchday_store=info".parse()?)
                .add_directive("matchday_common=info".parse()?),
        )
        .init();

    info!("Matchday bot starting");
    let config = Config::from_env();
    config.log_summary();

    let store = SqliteStore::connect(&config.database_url).await?;
    store.migrate().await?;
    let store: Arc<dyn RecordStore> = Arc::new(store);

    let fetch_config = FetchConfig::from(&config);
    let transport = HttpTransport::new(&fetch_config)?;
    let fetcher = Fetcher::new(Box::new(transport), fetch_config);
    let synchronizer = Synchronizer::new(
        store.clone(),
        config.dedup_tolerance(),
        config.write_delay(),
    );
    let updater = Arc::new(Updater::new(fetcher, synchronizer, config.team_url.clone()));

    let _scheduler = schedule::start(updater.clone(), &config.schedules).await?;

    let client = TelegramClient::new(&config.telegram_token);
    let bot = Bot::new(client, store, updater, &config);
    bot.register_commands().await?;
    bot.run().await;

    Ok(())
}
