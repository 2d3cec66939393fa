//! In-memory store backed by a plain `Vec`.
//!
//! Shares the fixture-identity upsert semantics with the SQLite store, so
//! pipeline code can run against it in tests and local dry runs.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Duration;

use matchday_common::MatchRecord;

use crate::{validate, RecordFilter, RecordStore, Result, UpsertOutcome};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<MatchRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn upsert(&self, record: &MatchRecord, tolerance: Duration) -> Result<UpsertOutcome> {
        validate(record)?;

        let mut records = self.records.lock().unwrap();
        match records.iter().position(|r| r.same_fixture(record, tolerance)) {
            Some(i) if records[i] == *record => Ok(UpsertOutcome::Unchanged),
            Some(i) => {
                records[i] = record.clone();
                Ok(UpsertOutcome::Modified)
            }
            None => {
                records.push(record.clone());
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn query(&self, filter: RecordFilter, limit: u32) -> Result<Vec<MatchRecord>> {
        let records = self.records.lock().unwrap();

        let mut matching: Vec<MatchRecord> = match filter {
            RecordFilter::Upcoming { after } => records
                .iter()
                .filter(|r| !r.is_completed && r.date >= after)
                .cloned()
                .collect(),
            RecordFilter::Completed => {
                records.iter().filter(|r| r.is_completed).cloned().collect()
            }
        };

        match filter {
            RecordFilter::Upcoming { .. } => matching.sort_by_key(|r| r.date),
            RecordFilter::Completed => matching.sort_by_key(|r| std::cmp::Reverse(r.date)),
        }
        matching.truncate(limit as usize);
        Ok(matching)
    }
}
