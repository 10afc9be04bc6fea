//! Background synchronization of per-user statistics.
//!
//! [`run_cycle`] reads every raw sample, reduces them and upserts the results.
//! [`SyncScheduler`] repeats it on a fixed interval without ever overlapping cycles.

pub mod cycle;
pub mod scheduler;

pub use cycle::{run_cycle, CycleOutcome, CyclePhase, CycleReport};
pub use scheduler::SyncScheduler;
