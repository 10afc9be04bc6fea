pub mod aggregator;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod models;
pub mod redact;
pub mod traits;

pub use aggregator::{reduce, reduce_at};
pub use config::{AppConfig, ServerConfig, SinkConfig, SourceConfig, SyncConfig};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
pub use error::SyncError;
pub use models::{RawSample, RawValue, StatRecord, UserId};
pub use redact::mask_credentials;
pub use traits::{HealthProbe, SampleSource, StatSink, StatWriter};
