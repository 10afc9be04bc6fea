//! In-memory stores implementing the same traits as the MySQL and MongoDB repositories.
//!
//! Used to exercise the sync cycle and the health surface without live databases.
//! Failures can be injected per store or per identity.

use analytics_core::{
    HealthProbe, RawSample, SampleSource, StatRecord, StatSink, StatWriter, SyncError, UserId,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Source returning a fixed snapshot, or a fixed failure.
#[derive(Debug, Default)]
pub struct MemorySource {
    samples: Vec<RawSample>,
    failure: Option<SyncError>,
    fetches: AtomicUsize,
}

impl MemorySource {
    #[must_use]
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self {
            samples,
            ..Self::default()
        }
    }

    /// A source whose every fetch fails with `SourceUnavailable(message)`.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::failing_with(SyncError::SourceUnavailable(message.into()))
    }

    /// A source whose every fetch fails with `error`.
    #[must_use]
    pub fn failing_with(error: SyncError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SampleSource for MemorySource {
    async fn fetch_all(&self) -> Result<Vec<RawSample>, SyncError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.samples.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct SinkState {
    documents: Mutex<BTreeMap<UserId, StatRecord>>,
    failing: HashSet<UserId>,
    unavailable: Option<String>,
    opens: AtomicUsize,
    upserts: AtomicUsize,
    closes: AtomicUsize,
}

/// Sink keeping documents in a map keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<SinkState>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects upserts for the given identities.
    #[must_use]
    pub fn failing_for<I, U>(identities: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        Self {
            state: Arc::new(SinkState {
                failing: identities.into_iter().map(Into::into).collect(),
                ..SinkState::default()
            }),
        }
    }

    /// A sink that cannot be opened at all.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            state: Arc::new(SinkState {
                unavailable: Some(message.into()),
                ..SinkState::default()
            }),
        }
    }

    /// Snapshot of the stored documents.
    pub async fn documents(&self) -> BTreeMap<UserId, StatRecord> {
        self.state.documents.lock().await.clone()
    }

    /// Number of upsert attempts, successful or not.
    #[must_use]
    pub fn upsert_count(&self) -> usize {
        self.state.upserts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatSink for MemorySink {
    type Writer = MemoryWriter;

    async fn open(&self) -> Result<MemoryWriter, SyncError> {
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.state.unavailable {
            return Err(SyncError::SinkUnavailable(message.clone()));
        }
        Ok(MemoryWriter {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MemoryWriter {
    state: Arc<SinkState>,
}

#[async_trait]
impl StatWriter for MemoryWriter {
    async fn upsert(&self, record: &StatRecord) -> Result<(), SyncError> {
        self.state.upserts.fetch_add(1, Ordering::SeqCst);
        if self.state.failing.contains(&record.identity) {
            return Err(SyncError::SinkUnavailable(format!(
                "write rejected for {}",
                record.identity
            )));
        }
        self.state
            .documents
            .lock()
            .await
            .insert(record.identity.clone(), record.clone());
        Ok(())
    }

    async fn close(self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Probe with a fixed outcome.
#[derive(Debug, Clone)]
pub struct MemoryProbe {
    name: &'static str,
    failure: Option<String>,
}

impl MemoryProbe {
    #[must_use]
    pub const fn healthy(name: &'static str) -> Self {
        Self {
            name,
            failure: None,
        }
    }

    #[must_use]
    pub fn failing(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl HealthProbe for MemoryProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn check(&self) -> Result<(), String> {
        self.failure.clone().map_or(Ok(()), Err)
    }
}
