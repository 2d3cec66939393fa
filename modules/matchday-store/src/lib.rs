pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use matchday_common::MatchRecord;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Modified,
    Unchanged,
}

/// Read filters used by the front end.
#[derive(Debug, Clone, Copy)]
pub enum RecordFilter {
    /// Not yet completed, at or after the given instant; soonest first.
    Upcoming { after: DateTime<Utc> },
    /// Completed matches; most recent first.
    Completed,
}

/// Durable home for match records. The synchronizer is the only writer; the
/// front end only reads. Records are never deleted, only upserted.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert-or-update by the fixture identity rule: an existing record with
    /// the same opponent and tournament whose date falls within `tolerance`
    /// of the incoming one is overwritten; otherwise a new record is created.
    async fn upsert(&self, record: &MatchRecord, tolerance: Duration) -> Result<UpsertOutcome>;

    async fn query(&self, filter: RecordFilter, limit: u32) -> Result<Vec<MatchRecord>>;
}

fn validate(record: &MatchRecord) -> Result<()> {
    if record.opponent.trim().is_empty() {
        return Err(StoreError::InvalidRecord("opponent must not be empty".to_string()));
    }
    if record.tournament.trim().is_empty() {
        return Err(StoreError::InvalidRecord(
            "tournament must not be empty".to_string(),
        ));
    }
    Ok(())
}
