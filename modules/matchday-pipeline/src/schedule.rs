//! Cron wiring for recurring update runs.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::update::Updater;

/// Register one job per cron expression, start the scheduler and kick off an
/// immediate run so a fresh deployment has data before the first trigger.
///
/// Returns the scheduler handle; dropping it stops the triggers.
pub async fn start(updater: Arc<Updater>, schedules: &[String]) -> Result<JobScheduler> {
    let sched = JobScheduler::new()
        .await
        .context("Failed to create job scheduler")?;

    for expression in schedules {
        let job_updater = updater.clone();
        let job = Job::new_async(expression.as_str(), move |_id, _scheduler| {
            let updater = job_updater.clone();
            Box::pin(async move {
                updater.run_scheduled("cron").await;
            })
        })
        .with_context(|| format!("Invalid schedule expression: {expression}"))?;
        sched.add(job).await.context("Failed to add scheduled job")?;
    }

    sched.start().await.context("Failed to start scheduler")?;
    info!(triggers = schedules.len(), "Update schedule started");

    let startup = updater.clone();
    tokio::spawn(async move {
        startup.run_scheduled("startup").await;
    });

    Ok(sched)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use matchday_common::config::DEFAULT_SCHEDULES;
    use matchday_common::MatchdayError;
    use matchday_store::MemoryStore;

    use crate::fetcher::{FetchConfig, Fetcher, Transport};
    use crate::sync::Synchronizer;

    use super::*;

    struct IdleTransport;

    #[async_trait]
    impl Transport for IdleTransport {
        async fn get(&self, _url: &str, _ua: &str) -> Result<String, MatchdayError> {
            Ok("<html></html>".to_string())
        }
    }

    fn make_updater() -> Arc<Updater> {
        let config = FetchConfig {
            retries: 1,
            retry_delay: Duration::ZERO,
            jitter_ms: (0, 0),
            ..FetchConfig::default()
        };
        let fetcher = Fetcher::new(Box::new(IdleTransport), config);
        let synchronizer = Synchronizer::new(
            Arc::new(MemoryStore::new()),
            chrono::Duration::minutes(60),
            Duration::ZERO,
        );
        Arc::new(Updater::new(
            fetcher,
            synchronizer,
            "https://example.test".to_string(),
        ))
    }

    #[tokio::test]
    async fn default_expressions_are_accepted() {
        let schedules: Vec<String> = DEFAULT_SCHEDULES.iter().map(|s| s.to_string()).collect();
        let mut sched = start(make_updater(), &schedules).await.unwrap();
        sched.shutdown().await.ok();
    }

    #[tokio::test]
    async fn invalid_expression_is_rejected() {
        let schedules = vec!["not a cron line".to_string()];
        assert!(start(make_updater(), &schedules).await.is_err());
    }
}
