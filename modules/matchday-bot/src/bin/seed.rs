//! One-shot seeding utility: plants a couple of demo fixtures through the
//! store's normal upsert path, so the bot can be exercised without touching
//! the real source.
//!
//! Usage: cargo run -p matchday-bot --bin seed

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::info;

use matchday_common::MatchRecord;
use matchday_store::{RecordStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://matchday.db?mode=rwc".to_string());
    let store = SqliteStore::connect(&database_url).await?;
    store.migrate().await?;

    let now = Utc::now();
    let records = [
        MatchRecord {
            date: now + Duration::days(2),
            opponent: "Team Vitality".to_string(),
            tournament: "ESL Pro League Season 19".to_string(),
            stage: Some("Group stage".to_string()),
            stream_link: Some("https://www.twitch.tv/esl_cs2".to_string()),
            score: None,
            is_completed: false,
            source: "seed".to_string(),
        },
        MatchRecord {
            date: now + Duration::days(4),
            opponent: "Natus Vincere".to_string(),
            tournament: "BLAST Premier Spring Final".to_string(),
            stage: Some("Quarter-final".to_string()),
            stream_link: Some("https://www.twitch.tv/blastpremier".to_string()),
            score: None,
            is_completed: false,
            source: "seed".to_string(),
        },
    ];

    for record in &records {
        let outcome = store.upsert(record, Duration::minutes(60)).await?;
        info!(opponent = record.opponent.as_str(), ?outcome, "Seeded record");
    }

    info!(records = records.len(), "Seeding finished");
    Ok(())
}
