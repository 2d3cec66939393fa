//! One full acquisition pass, guarded so only a single run is ever in
//! flight. Cron triggers and the bot's forced updates share the same path.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tracing::{error, info, warn};

use matchday_common::MatchdayError;

use crate::fetcher::Fetcher;
use crate::parser;
use crate::sync::Synchronizer;

pub struct Updater {
    fetcher: Fetcher,
    synchronizer: Synchronizer,
    source_url: String,
    running: AtomicBool,
    runs_skipped: AtomicU32,
}

impl Updater {
    pub fn new(fetcher: Fetcher, synchronizer: Synchronizer, source_url: String) -> Self {
        Self {
            fetcher,
            synchronizer,
            source_url,
            running: AtomicBool::new(false),
            runs_skipped: AtomicU32::new(0),
        }
    }

    /// Run the pipeline once and return how many records changed.
    ///
    /// If another run holds the flag this returns `UpdateInProgress`
    /// immediately instead of queueing behind it. The flag is released on
    /// every exit path, success or failure.
    pub async fn force_update(&self) -> Result<u32, MatchdayError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.runs_skipped.fetch_add(1, Ordering::SeqCst);
            warn!("Update already in progress, skipping run");
            return Err(MatchdayError::UpdateInProgress);
        }

        let result = self.run_pipeline().await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    /// Trigger wrapper for cron and startup runs: outcomes are logged, never
    /// propagated, so a failed pass cannot take the schedule down.
    pub async fn run_scheduled(&self, trigger: &str) {
        info!(trigger, "Starting update run");
        match self.force_update().await {
            Ok(changed) => info!(trigger, changed, "Update run complete"),
            Err(MatchdayError::UpdateInProgress) => {}
            Err(e) => error!(trigger, error = %e, "Update run failed"),
        }
    }

    pub fn runs_skipped(&self) -> u32 {
        self.runs_skipped.load(Ordering::SeqCst)
    }

    async fn run_pipeline(&self) -> Result<u32, MatchdayError> {
        let html = self.fetcher.fetch(&self.source_url).await?;
        let records = parser::parse(&html);
        info!(records = records.len(), "Parsed match records");

        let report = self.synchronizer.sync(&records).await;
        Ok(report.changed())
    }
}
