//! One-shot sync cycle, printed as JSON.

use analytics_core::AppConfig;
use analytics_data::Repositories;
use analytics_sync::{CycleOutcome, CycleReport, SyncScheduler};
use anyhow::Result;
use std::sync::Arc;

/// Runs a single cycle against the configured stores and prints its report.
///
/// # Errors
/// Returns an error if the cycle did not succeed for every record.
pub async fn run_sync_once(config: AppConfig) -> Result<()> {
    let repos = Repositories::new(&config);
    let scheduler = SyncScheduler::new(config.sync, Arc::new(repos.samples), Arc::new(repos.stats));

    let report = scheduler.run_once().await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    check_outcome(&report)
}

fn check_outcome(report: &CycleReport) -> Result<()> {
    let summary = report.failure_summary().unwrap_or_default();
    match report.outcome() {
        CycleOutcome::Succeeded => Ok(()),
        CycleOutcome::Degraded => anyhow::bail!(
            "Sync cycle degraded: {} of {} records not written, first error in {}",
            report.failed,
            report.records_computed,
            summary
        ),
        CycleOutcome::Failed => anyhow::bail!("Sync cycle failed in {}", summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics_core::{RawSample, SyncConfig};
    use analytics_data::{MemorySink, MemorySource};

    fn scheduler(source: MemorySource, sink: MemorySink) -> SyncScheduler<MemorySource, MemorySink> {
        let config = SyncConfig {
            interval_secs: 60,
            initial_delay_secs: 0,
        };
        SyncScheduler::new(config, Arc::new(source), Arc::new(sink))
    }

    #[tokio::test]
    async fn test_successful_cycle_passes() {
        let sink = MemorySink::new();
        let source = MemorySource::new(vec![RawSample::new("u1", 1.0), RawSample::new("u1", 3.0)]);

        let report = scheduler(source, sink.clone()).run_once().await;
        assert!(check_outcome(&report).is_ok());
        assert_eq!(sink.documents().await.len(), 1);
    }

    #[tokio::test]
    async fn test_degraded_cycle_is_an_error() {
        let source = MemorySource::new(vec![RawSample::new("u1", 1.0), RawSample::new("u2", 2.0)]);
        let report = scheduler(source, MemorySink::failing_for(["u2"])).run_once().await;

        let err = check_outcome(&report).unwrap_err().to_string();
        assert!(err.contains("1 of 2 records not written"));
        assert!(err.contains("writing [sink_unavailable]"));
    }

    #[tokio::test]
    async fn test_failed_cycle_is_an_error() {
        let report = scheduler(MemorySource::unavailable("refused"), MemorySink::new())
            .run_once()
            .await;

        let err = check_outcome(&report).unwrap_err().to_string();
        assert_eq!(
            err,
            "Sync cycle failed in reading [source_unavailable]: source unavailable: refused"
        );
    }
}
