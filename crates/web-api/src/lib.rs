pub mod health;
pub mod server;
pub mod service_info;

pub use health::{HealthStatus, Status};
pub use server::{ApiServer, ApiState};
pub use service_info::ServiceInfo;
