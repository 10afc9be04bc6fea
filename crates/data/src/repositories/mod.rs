//! Store repositories for the analytics sync service.
//!
//! `SampleRepository` reads the relational source-of-record and
//! `StatRepository` writes the document store. Neither keeps a pool:
//! connections are opened per operation.

pub mod sample_repo;
pub mod stat_repo;

pub use sample_repo::SampleRepository;
pub use stat_repo::{MongoStatWriter, StatRepository};

use analytics_core::AppConfig;

/// Both repositories built from one configuration.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub samples: SampleRepository,
    pub stats: StatRepository,
}

impl Repositories {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            samples: SampleRepository::new(&config.source),
            stats: StatRepository::new(&config.sink),
        }
    }
}
