//! Store adapters for the user analytics sync service.
//!
//! This crate provides:
//! - The MySQL sample reader and the MongoDB statistics writer
//! - Readiness probes for both stores
//! - In-memory doubles implementing the same traits

pub mod memory;
pub mod repositories;

pub use memory::{MemoryProbe, MemorySink, MemorySource};
pub use repositories::{MongoStatWriter, Repositories, SampleRepository, StatRepository};
