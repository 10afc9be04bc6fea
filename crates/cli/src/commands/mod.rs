//! CLI commands for the analytics sync service.

pub mod run;
pub mod show_config;
pub mod sync_once;

pub use run::{run_serve, run_service};
pub use show_config::run_show_config;
pub use sync_once::run_sync_once;
