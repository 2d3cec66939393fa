//! SQLite-backed record store.
//!
//! Dates are stored as unix seconds so the fixture-identity window can be a
//! plain `BETWEEN` over an indexed integer column.

use async_trait::async_trait;
use chrono::{DateTime, Duration};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;

use matchday_common::MatchRecord;

use crate::{validate, RecordFilter, RecordStore, Result, StoreError, UpsertOutcome};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open a connection pool against `database_url`
    /// (e.g. `sqlite://matchday.db?mode=rwc`).
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

        info!(database_url, "Connected to SQLite store");
        Ok(Self { pool })
    }

    /// Wrap an existing pool. Callers are responsible for pragmas.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the schema. Idempotent, runs on every startup.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date_unix INTEGER NOT NULL,
                opponent TEXT NOT NULL,
                tournament TEXT NOT NULL,
                stage TEXT,
                stream_link TEXT,
                score TEXT,
                is_completed INTEGER NOT NULL DEFAULT 0,
                source TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_matches_identity \
             ON matches (opponent, tournament, date_unix)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_matches_completed_date \
             ON matches (is_completed, date_unix)",
        )
        .execute(&self.pool)
        .await?;

        info!("Store schema ready");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn upsert(&self, record: &MatchRecord, tolerance: Duration) -> Result<UpsertOutcome> {
        validate(record)?;

        let date_unix = record.date.timestamp();
        let window = tolerance.num_seconds();

        // Nearest candidate wins when two fixtures sit inside the window.
        let existing = sqlx::query(
            "SELECT id, date_unix, stage, stream_link, score, is_completed, source \
             FROM matches \
             WHERE opponent = ? AND tournament = ? AND date_unix BETWEEN ? AND ? \
             ORDER BY ABS(date_unix - ?) LIMIT 1",
        )
        .bind(&record.opponent)
        .bind(&record.tournament)
        .bind(date_unix - window)
        .bind(date_unix + window)
        .bind(date_unix)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = existing else {
            sqlx::query(
                "INSERT INTO matches \
                 (date_unix, opponent, tournament, stage, stream_link, score, is_completed, source) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(date_unix)
            .bind(&record.opponent)
            .bind(&record.tournament)
            .bind(&record.stage)
            .bind(&record.stream_link)
            .bind(&record.score)
            .bind(record.is_completed)
            .bind(&record.source)
            .execute(&self.pool)
            .await?;
            return Ok(UpsertOutcome::Inserted);
        };

        let unchanged = row.get::<i64, _>("date_unix") == date_unix
            && row.get::<Option<String>, _>("stage") == record.stage
            && row.get::<Option<String>, _>("stream_link") == record.stream_link
            && row.get::<Option<String>, _>("score") == record.score
            && row.get::<bool, _>("is_completed") == record.is_completed
            && row.get::<String, _>("source") == record.source;
        if unchanged {
            return Ok(UpsertOutcome::Unchanged);
        }

        sqlx::query(
            "UPDATE matches \
             SET date_unix = ?, stage = ?, stream_link = ?, score = ?, \
                 is_completed = ?, source = ?, updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?",
        )
        .bind(date_unix)
        .bind(&record.stage)
        .bind(&record.stream_link)
        .bind(&record.score)
        .bind(record.is_completed)
        .bind(&record.source)
        .bind(row.get::<i64, _>("id"))
        .execute(&self.pool)
        .await?;
        Ok(UpsertOutcome::Modified)
    }

    async fn query(&self, filter: RecordFilter, limit: u32) -> Result<Vec<MatchRecord>> {
        const COLUMNS: &str =
            "date_unix, opponent, tournament, stage, stream_link, score, is_completed, source";

        let rows = match filter {
            RecordFilter::Upcoming { after } => {
                sqlx::query(&format!(
                    "SELECT {COLUMNS} FROM matches \
                     WHERE is_completed = 0 AND date_unix >= ? \
                     ORDER BY date_unix ASC LIMIT ?"
                ))
                .bind(after.timestamp())
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
            RecordFilter::Completed => {
                sqlx::query(&format!(
                    "SELECT {COLUMNS} FROM matches \
                     WHERE is_completed = 1 \
                     ORDER BY date_unix DESC LIMIT ?"
                ))
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_record).collect()
    }
}

fn row_to_record(row: &SqliteRow) -> Result<MatchRecord> {
    let date_unix: i64 = row.get("date_unix");
    let date = DateTime::from_timestamp(date_unix, 0)
        .ok_or_else(|| StoreError::Database(format!("Stored timestamp out of range: {date_unix}")))?;

    Ok(MatchRecord {
        date,
        opponent: row.get("opponent"),
        tournament: row.get("tournament"),
        stage: row.get("stage"),
        stream_link: row.get("stream_link"),
        score: row.get("score"),
        is_completed: row.get("is_completed"),
        source: row.get("source"),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use matchday_common::SOURCE_HLTV;

    use super::*;

    /// A pooled second connection would see its own empty in-memory database,
    /// so the test pool is pinned to a single connection.
    async fn memory_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteStore::from_pool(pool);
        store.migrate().await.unwrap();
        store
    }

    fn make_record(opponent: &str, hour: u32, completed: bool) -> MatchRecord {
        MatchRecord {
            date: Utc.with_ymd_and_hms(2026, 9, 10, hour, 0, 0).unwrap(),
            opponent: opponent.to_string(),
            tournament: "ESL Pro League".to_string(),
            stage: None,
            stream_link: Some("https://www.twitch.tv/esl_csgo".to_string()),
            score: completed.then(|| "2 - 0".to_string()),
            is_completed: completed,
            source: SOURCE_HLTV.to_string(),
        }
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let store = memory_store().await;
        store.migrate().await.unwrap();
        store.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn insert_then_read_back_round_trips() {
        let store = memory_store().await;
        let record = make_record("NAVI", 18, false);

        let outcome = store.upsert(&record, Duration::hours(1)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let after = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let stored = store
            .query(RecordFilter::Upcoming { after }, 10)
            .await
            .unwrap();
        assert_eq!(stored, vec![record]);
    }

    #[tokio::test]
    async fn identical_record_is_unchanged() {
        let store = memory_store().await;
        let record = make_record("NAVI", 18, false);
        store.upsert(&record, Duration::hours(1)).await.unwrap();

        let outcome = store.upsert(&record, Duration::hours(1)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged);
    }

    #[tokio::test]
    async fn shifted_date_within_tolerance_overwrites() {
        let store = memory_store().await;
        store
            .upsert(&make_record("NAVI", 18, false), Duration::hours(1))
            .await
            .unwrap();

        let mut shifted = make_record("NAVI", 18, false);
        shifted.date += Duration::minutes(45);
        let outcome = store.upsert(&shifted, Duration::hours(1)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Modified);

        let after = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let stored = store
            .query(RecordFilter::Upcoming { after }, 10)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].date, shifted.date);
    }

    #[tokio::test]
    async fn shifted_date_beyond_tolerance_inserts_second_record() {
        let store = memory_store().await;
        store
            .upsert(&make_record("NAVI", 12, false), Duration::hours(1))
            .await
            .unwrap();

        let mut rematch = make_record("NAVI", 12, false);
        rematch.date += Duration::hours(6);
        let outcome = store.upsert(&rematch, Duration::hours(1)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let after = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let stored = store
            .query(RecordFilter::Upcoming { after }, 10)
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn score_change_marks_modified() {
        let store = memory_store().await;
        store
            .upsert(&make_record("FaZe", 20, true), Duration::hours(1))
            .await
            .unwrap();

        let mut corrected = make_record("FaZe", 20, true);
        corrected.score = Some("2 - 1".to_string());
        let outcome = store.upsert(&corrected, Duration::hours(1)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Modified);

        let completed = store.query(RecordFilter::Completed, 10).await.unwrap();
        assert_eq!(completed[0].score.as_deref(), Some("2 - 1"));
    }

    #[tokio::test]
    async fn queries_split_and_order_by_filter() {
        let store = memory_store().await;
        for (opponent, hour, completed) in [
            ("Soonest", 10, false),
            ("Later", 16, false),
            ("OldResult", 6, true),
            ("NewResult", 8, true),
        ] {
            store
                .upsert(&make_record(opponent, hour, completed), Duration::hours(1))
                .await
                .unwrap();
        }

        let after = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let upcoming = store
            .query(RecordFilter::Upcoming { after }, 10)
            .await
            .unwrap();
        assert_eq!(
            upcoming.iter().map(|r| r.opponent.as_str()).collect::<Vec<_>>(),
            vec!["Soonest", "Later"]
        );

        let completed = store.query(RecordFilter::Completed, 10).await.unwrap();
        assert_eq!(
            completed.iter().map(|r| r.opponent.as_str()).collect::<Vec<_>>(),
            vec!["NewResult", "OldResult"]
        );
    }

    #[tokio::test]
    async fn upcoming_query_cuts_off_before_after_instant() {
        let store = memory_store().await;
        store
            .upsert(&make_record("Past", 8, false), Duration::hours(1))
            .await
            .unwrap();
        store
            .upsert(&make_record("Future", 20, false), Duration::hours(1))
            .await
            .unwrap();

        let after = Utc.with_ymd_and_hms(2026, 9, 10, 12, 0, 0).unwrap();
        let upcoming = store
            .query(RecordFilter::Upcoming { after }, 10)
            .await
            .unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].opponent, "Future");
    }

    #[tokio::test]
    async fn blank_tournament_is_rejected() {
        let store = memory_store().await;
        let mut record = make_record("NAVI", 18, false);
        record.tournament = " ".to_string();

        let err = store.upsert(&record, Duration::hours(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
    }
}
