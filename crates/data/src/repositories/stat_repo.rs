//! Statistics repository backed by the analytics collection of MongoDB.

use analytics_core::{
    mask_credentials, HealthProbe, SinkConfig, StatRecord, StatSink, StatWriter, SyncError,
};
use async_trait::async_trait;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::options::UpdateOptions;
use mongodb::{Client, Collection, IndexModel};
use tracing::{debug, info};

/// Repository for per-user statistic documents.
///
/// Holds only the connection settings. Each writer, probe or index call
/// builds its own client.
#[derive(Debug, Clone)]
pub struct StatRepository {
    locator: String,
    database: String,
    collection: String,
}

impl StatRepository {
    #[must_use]
    pub fn new(config: &SinkConfig) -> Self {
        Self {
            locator: config.locator(),
            database: config.database.clone(),
            collection: config.collection.clone(),
        }
    }

    async fn client(&self) -> Result<Client, SyncError> {
        debug!("Connecting to {}", mask_credentials(&self.locator));
        Client::with_uri_str(&self.locator).await.map_err(sink_error)
    }

    fn collection(&self, client: &Client) -> Collection<Document> {
        client.database(&self.database).collection(&self.collection)
    }

    /// Runs `{ping: 1}` against the configured database.
    ///
    /// # Errors
    /// Returns `SinkUnavailable` if the client cannot be built or the command fails.
    pub async fn ping(&self) -> Result<(), SyncError> {
        let client = self.client().await?;
        let result = client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await;
        client.shutdown().await;
        result.map(|_| ()).map_err(sink_error)
    }

    /// Creates the ascending `userid` index used by the upsert filter.
    ///
    /// Idempotent: MongoDB ignores an identical existing index.
    ///
    /// # Errors
    /// Returns `SinkUnavailable` if the index cannot be created.
    pub async fn ensure_indexes(&self) -> Result<(), SyncError> {
        let client = self.client().await?;
        let index = IndexModel::builder().keys(doc! { "userid": 1 }).build();
        let result = self.collection(&client).create_index(index).await;
        client.shutdown().await;
        let created = result.map_err(sink_error)?;
        info!("Ensured index {} on {}.{}", created.index_name, self.database, self.collection);
        Ok(())
    }
}

#[async_trait]
impl StatSink for StatRepository {
    type Writer = MongoStatWriter;

    async fn open(&self) -> Result<MongoStatWriter, SyncError> {
        let client = self.client().await?;
        let collection = self.collection(&client);
        Ok(MongoStatWriter { client, collection })
    }
}

#[async_trait]
impl HealthProbe for StatRepository {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn check(&self) -> Result<(), String> {
        self.ping().await.map_err(|e| e.to_string())
    }
}

/// Writer bound to one client for the duration of a cycle.
pub struct MongoStatWriter {
    client: Client,
    collection: Collection<Document>,
}

#[async_trait]
impl StatWriter for MongoStatWriter {
    async fn upsert(&self, record: &StatRecord) -> Result<(), SyncError> {
        let UpsertCommand {
            filter,
            update,
            options,
        } = upsert_command(record);
        self.collection
            .update_one(filter, update)
            .with_options(options)
            .await
            .map(|_| ())
            .map_err(sink_error)
    }

    async fn close(self) {
        let Self { client, collection } = self;
        drop(collection);
        client.shutdown().await;
    }
}

/// Arguments of the `update_one` call that stores one record.
struct UpsertCommand {
    filter: Document,
    update: Document,
    options: UpdateOptions,
}

/// Matches on `userid` and inserts the document when no match exists.
fn upsert_command(record: &StatRecord) -> UpsertCommand {
    UpsertCommand {
        filter: doc! { "userid": record.identity.as_str() },
        update: doc! { "$set": stat_fields(record) },
        options: UpdateOptions::builder().upsert(true).build(),
    }
}

/// Fields replaced on every upsert. `userid` comes from the filter on insert.
fn stat_fields(record: &StatRecord) -> Document {
    doc! {
        "max": record.max,
        "min": record.min,
        "avg": record.avg,
        "count": i64::try_from(record.count).unwrap_or(i64::MAX),
        "last_updated": BsonDateTime::from_millis(record.last_updated.timestamp_millis()),
    }
}

fn sink_error(e: mongodb::error::Error) -> SyncError {
    SyncError::SinkUnavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics_core::UserId;
    use chrono::{TimeZone, Utc};

    fn sample_record() -> StatRecord {
        StatRecord {
            identity: UserId::new("u1"),
            max: 30.0,
            min: 10.0,
            avg: 20.0,
            count: 3,
            last_updated: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn test_upsert_command() {
        let record = sample_record();
        let command = upsert_command(&record);

        assert_eq!(command.filter, doc! { "userid": "u1" });
        assert_eq!(command.options.upsert, Some(true));
        assert_eq!(command.update.len(), 1);
        assert_eq!(
            command.update.get_document("$set").unwrap(),
            &stat_fields(&record)
        );
    }

    #[test]
    fn test_stat_fields() {
        let record = sample_record();
        let fields = stat_fields(&record);
        assert_eq!(fields.get_f64("max").unwrap(), 30.0);
        assert_eq!(fields.get_f64("min").unwrap(), 10.0);
        assert_eq!(fields.get_f64("avg").unwrap(), 20.0);
        assert_eq!(fields.get_i64("count").unwrap(), 3);
        assert_eq!(
            fields.get_datetime("last_updated").unwrap().timestamp_millis(),
            record.last_updated.timestamp_millis()
        );
        assert!(fields.get("userid").is_none());
    }

    #[test]
    fn test_repository_uses_assembled_locator() {
        let config = analytics_core::AppConfig::default().sink;
        let repo = StatRepository::new(&config);
        assert!(repo.locator.ends_with("?authSource=analyticsdb"));
        assert_eq!(repo.collection, "analytics");
    }
}
