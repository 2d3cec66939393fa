//! Batch synchronization of parsed records into the store.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use matchday_common::MatchRecord;
use matchday_store::{RecordStore, UpsertOutcome};

/// Outcome tally for one synchronization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: u32,
    pub modified: u32,
    pub unchanged: u32,
    pub failed: u32,
}

impl SyncReport {
    /// Records the pass actually wrote.
    pub fn changed(&self) -> u32 {
        self.inserted + self.modified
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} modified, {} unchanged, {} failed",
            self.inserted, self.modified, self.unchanged, self.failed
        )
    }
}

pub struct Synchronizer {
    store: Arc<dyn RecordStore>,
    tolerance: chrono::Duration,
    write_delay: Duration,
}

impl Synchronizer {
    pub fn new(
        store: Arc<dyn RecordStore>,
        tolerance: chrono::Duration,
        write_delay: Duration,
    ) -> Self {
        Self {
            store,
            tolerance,
            write_delay,
        }
    }

    /// Upsert every record in order. Failures are isolated: one bad record is
    /// counted and logged, never allowed to stop the rest of the batch.
    pub async fn sync(&self, records: &[MatchRecord]) -> SyncReport {
        let mut report = SyncReport::default();

        for (index, record) in records.iter().enumerate() {
            // Writes are spaced progressively so a batch lands as a trickle
            // rather than a burst.
            if index > 0 && !self.write_delay.is_zero() {
                tokio::time::sleep(self.write_delay * index as u32).await;
            }

            match self.store.upsert(record, self.tolerance).await {
                Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                Ok(UpsertOutcome::Modified) => report.modified += 1,
                Ok(UpsertOutcome::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    warn!(
                        opponent = record.opponent.as_str(),
                        tournament = record.tournament.as_str(),
                        error = %e,
                        "Failed to upsert record, continuing"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(records = records.len(), %report, "Synchronization pass finished");
        report
    }
}
