use analytics_core::{SampleSource, StatSink, SyncConfig};
use std::sync::Arc;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::cycle::{run_cycle, CycleOutcome, CycleReport};

/// Runs the sync cycle on a fixed interval, one cycle at a time.
///
/// Cycles execute sequentially on a single task. A cycle that outlasts the
/// interval makes the scheduler skip the missed ticks instead of queueing them.
pub struct SyncScheduler<S: ?Sized, K: ?Sized> {
    config: SyncConfig,
    source: Arc<S>,
    sink: Arc<K>,
}

impl<S, K> SyncScheduler<S, K>
where
    S: SampleSource + ?Sized + 'static,
    K: StatSink + ?Sized + 'static,
{
    /// Creates a new sync scheduler.
    #[must_use]
    pub fn new(config: SyncConfig, source: Arc<S>, sink: Arc<K>) -> Self {
        Self {
            config,
            source,
            sink,
        }
    }

    /// Starts the loop. Never returns.
    pub async fn start(self) {
        self.run(None).await;
    }

    /// Runs the loop for at most `max_cycles` cycles, or forever with `None`.
    ///
    /// Returns the number of cycles run.
    pub async fn run(&self, max_cycles: Option<u64>) -> u64 {
        info!(
            "Starting sync scheduler: interval {}s, initial delay {}s",
            self.config.interval_secs, self.config.initial_delay_secs
        );
        sleep(Duration::from_secs(self.config.initial_delay_secs)).await;

        // tokio panics on a zero period.
        let mut ticker = interval(Duration::from_secs(self.config.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut cycles = 0;
        loop {
            if max_cycles.is_some_and(|max| cycles >= max) {
                return cycles;
            }
            ticker.tick().await;
            cycles += 1;

            let source = Arc::clone(&self.source);
            let sink = Arc::clone(&self.sink);
            // The cycle runs on its own task so a panic is contained to that cycle.
            let handle = tokio::spawn(async move { run_cycle(source.as_ref(), sink.as_ref()).await });

            match handle.await {
                Ok(report) => log_report(cycles, &report),
                Err(e) if e.is_panic() => error!("Sync cycle {} panicked: {}", cycles, e),
                Err(e) => error!("Sync cycle {} did not complete: {}", cycles, e),
            }
        }
    }

    /// Runs a single cycle immediately, outside the schedule.
    pub async fn run_once(&self) -> CycleReport {
        let report = run_cycle(self.source.as_ref(), self.sink.as_ref()).await;
        log_report(0, &report);
        report
    }
}

fn log_report(cycle: u64, report: &CycleReport) {
    match report.outcome() {
        CycleOutcome::Succeeded => info!(
            "Sync cycle {} succeeded: {} samples, {} records written in {}ms",
            cycle,
            report.samples_read,
            report.written,
            report.duration_ms()
        ),
        CycleOutcome::Degraded => warn!(
            "Sync cycle {} degraded: {} written, {} failed ({:?}), first error in {}",
            cycle,
            report.written,
            report.failed,
            report.failed_identities,
            report.failure_summary().unwrap_or_default()
        ),
        CycleOutcome::Failed => error!(
            "Sync cycle {} failed in {}",
            cycle,
            report.failure_summary().unwrap_or_default()
        ),
    }
}
