//! Raw sample repository.
//!
//! Reads the `(userid, value)` table of the relational source-of-record.
//! Every call opens its own connection and closes it before returning.

use analytics_core::{
    HealthProbe, RawSample, RawValue, SampleSource, SourceConfig, SyncError, UserId,
};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, warn};

/// Values and ids are cast to text so malformed values surface as
/// `InvalidSample` in the aggregator instead of a decode error here.
const FETCH_ALL_SQL: &str = r"
    SELECT CAST(userid AS CHAR) AS userid, CAST(value AS CHAR) AS value
    FROM data
";

/// Repository for raw measurement rows.
#[derive(Debug, Clone)]
pub struct SampleRepository {
    options: MySqlConnectOptions,
}

impl SampleRepository {
    /// Creates a repository; no connection is made until an operation runs.
    #[must_use]
    pub fn new(config: &SourceConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);
        Self { options }
    }

    async fn connect(&self) -> Result<MySqlConnection, SyncError> {
        self.options.connect().await.map_err(source_error)
    }

    /// Runs `SELECT 1` on a fresh connection.
    ///
    /// # Errors
    /// Returns `SourceUnavailable` if the connection or the query fails.
    pub async fn ping(&self) -> Result<(), SyncError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("SELECT 1").execute(&mut conn).await;
        close(conn).await;
        result.map(|_| ()).map_err(source_error)
    }
}

#[async_trait]
impl SampleSource for SampleRepository {
    async fn fetch_all(&self) -> Result<Vec<RawSample>, SyncError> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query_as::<_, (Option<String>, Option<String>)>(FETCH_ALL_SQL)
            .fetch_all(&mut conn)
            .await;
        close(conn).await;
        let rows = rows.map_err(source_error)?;

        debug!("Fetched {} raw rows", rows.len());
        rows.into_iter().map(into_sample).collect()
    }
}

#[async_trait]
impl HealthProbe for SampleRepository {
    fn name(&self) -> &'static str {
        "mysql"
    }

    async fn check(&self) -> Result<(), String> {
        self.ping().await.map_err(|e| e.to_string())
    }
}

/// Rejects rows without a `userid`; the cycle reports them under the reading phase.
fn into_sample(
    (userid, value): (Option<String>, Option<String>),
) -> Result<RawSample, SyncError> {
    let Some(userid) = userid else {
        return Err(SyncError::InvalidSample {
            identity: UserId::new("NULL"),
            reason: "row has no userid".to_string(),
        });
    };
    Ok(RawSample {
        identity: UserId::new(userid),
        value: RawValue::from(value),
    })
}

async fn close(conn: MySqlConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close MySQL connection cleanly: {}", e);
    }
}

fn source_error(e: sqlx::Error) -> SyncError {
    SyncError::SourceUnavailable(e.to_string())
}
