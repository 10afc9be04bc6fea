use crate::error::SyncError;
use crate::models::{RawSample, StatRecord};
use async_trait::async_trait;

/// Bulk reader over the relational source-of-record.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Reads every raw sample. No filtering, no ordering guarantee.
    async fn fetch_all(&self) -> Result<Vec<RawSample>, SyncError>;
}

/// Opens writers against the document store.
///
/// A writer lives for one cycle; its connection is released when it is dropped.
#[async_trait]
pub trait StatSink: Send + Sync {
    type Writer: StatWriter;

    async fn open(&self) -> Result<Self::Writer, SyncError>;
}

#[async_trait]
pub trait StatWriter: Send + Sync {
    /// Replaces the statistics stored for `record.identity`, inserting them if absent.
    async fn upsert(&self, record: &StatRecord) -> Result<(), SyncError>;

    /// Releases the underlying connection. Dropping the writer also releases it.
    async fn close(self);
}

/// Connectivity check against one external dependency.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Name reported in readiness checks, e.g. `"mysql"`.
    fn name(&self) -> &'static str;

    /// Opens a short-lived connection and runs a trivial command.
    ///
    /// # Errors
    /// Returns the driver's error text when the dependency is unreachable.
    async fn check(&self) -> Result<(), String>;
}
