//! One Reading → Aggregating → Writing pass.
//!
//! A cycle never returns an error. Every failure is folded into the
//! [`CycleReport`] so the scheduler can log it and wait for the next tick.

use analytics_core::{aggregator, SampleSource, StatSink, StatWriter, SyncError, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Where a cycle is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    Reading,
    Aggregating,
    Writing,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Reading => write!(f, "reading"),
            Self::Aggregating => write!(f, "aggregating"),
            Self::Writing => write!(f, "writing"),
        }
    }
}

/// Overall verdict of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Every computed record was written (possibly zero of them).
    Succeeded,
    /// Writing ran but at least one record was not persisted.
    Degraded,
    /// Reading or aggregating failed; nothing was written.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub samples_read: usize,
    pub records_computed: usize,
    pub written: usize,
    pub failed: usize,
    pub failed_identities: Vec<UserId>,
    /// Phase in which `error` surfaced. The reader rejects rows without a
    /// `userid`, so an `invalid_sample` error can be reported under `reading`.
    pub failed_phase: Option<CyclePhase>,
    pub error: Option<SyncError>,
}

impl CycleReport {
    fn begin() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            samples_read: 0,
            records_computed: 0,
            written: 0,
            failed: 0,
            failed_identities: Vec::new(),
            failed_phase: None,
            error: None,
        }
    }

    fn abort(mut self, phase: CyclePhase, error: SyncError) -> Self {
        self.failed_phase = Some(phase);
        self.error = Some(error);
        self.finish()
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        debug!("Cycle phase: {}", CyclePhase::Idle);
        self
    }

    #[must_use]
    pub fn outcome(&self) -> CycleOutcome {
        match self.failed_phase {
            Some(CyclePhase::Reading | CyclePhase::Aggregating) => CycleOutcome::Failed,
            _ if self.failed > 0 => CycleOutcome::Degraded,
            _ => CycleOutcome::Succeeded,
        }
    }

    /// One-line description of the first error, e.g.
    /// `reading [source_unavailable]: source unavailable: refused`.
    #[must_use]
    pub fn failure_summary(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        let phase = self
            .failed_phase
            .map_or_else(|| "unknown".to_string(), |p| p.to_string());
        Some(format!("{phase} [{}]: {error}", error.kind()))
    }

    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Runs one full cycle against `source` and `sink`.
///
/// A source or aggregation failure ends the cycle before anything is written.
/// During writing every record is attempted; individual failures are counted.
pub async fn run_cycle<S, K>(source: &S, sink: &K) -> CycleReport
where
    S: SampleSource + ?Sized,
    K: StatSink + ?Sized,
{
    let mut report = CycleReport::begin();

    debug!("Cycle phase: {}", CyclePhase::Reading);
    let samples = match source.fetch_all().await {
        Ok(samples) => samples,
        Err(e) => return report.abort(CyclePhase::Reading, e),
    };
    report.samples_read = samples.len();

    debug!("Cycle phase: {}", CyclePhase::Aggregating);
    let records = match aggregator::reduce(samples) {
        Ok(records) => records,
        Err(e) => return report.abort(CyclePhase::Aggregating, e),
    };
    report.records_computed = records.len();

    if records.is_empty() {
        return report.finish();
    }

    debug!("Cycle phase: {}", CyclePhase::Writing);
    let writer = match sink.open().await {
        Ok(writer) => writer,
        Err(e) => {
            report.failed = records.len();
            report.failed_identities = records.into_keys().collect();
            return report.abort(CyclePhase::Writing, e);
        }
    };

    for record in records.values() {
        match writer.upsert(record).await {
            Ok(()) => report.written += 1,
            Err(e) => {
                warn!("Upsert failed for user {}: {}", record.identity, e);
                report.failed += 1;
                report.failed_identities.push(record.identity.clone());
                if report.error.is_none() {
                    report.failed_phase = Some(CyclePhase::Writing);
                    report.error = Some(e);
                }
            }
        }
    }
    writer.close().await;

    report.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        let mut report = CycleReport::begin();
        assert_eq!(report.outcome(), CycleOutcome::Succeeded);

        report.failed = 1;
        report.failed_phase = Some(CyclePhase::Writing);
        assert_eq!(report.outcome(), CycleOutcome::Degraded);

        let report = CycleReport::begin().abort(
            CyclePhase::Reading,
            SyncError::SourceUnavailable("refused".to_string()),
        );
        assert_eq!(report.outcome(), CycleOutcome::Failed);
    }

    #[test]
    fn test_report_serialization() {
        let report = CycleReport::begin().abort(
            CyclePhase::Aggregating,
            SyncError::SourceUnavailable("refused".to_string()),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed_phase"], "aggregating");
        assert_eq!(json["error"]["kind"], "source_unavailable");
        assert_eq!(json["error"]["detail"], "refused");
    }

    #[test]
    fn test_failure_summary() {
        assert_eq!(CycleReport::begin().failure_summary(), None);

        let report = CycleReport::begin().abort(
            CyclePhase::Reading,
            SyncError::SourceUnavailable("refused".to_string()),
        );
        assert_eq!(
            report.failure_summary().as_deref(),
            Some("reading [source_unavailable]: source unavailable: refused")
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(CyclePhase::Writing.to_string(), "writing");
    }
}
