use crate::{health, service_info};
use analytics_core::{AppConfig, HealthProbe};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Read-only state shared by every request.
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<AppConfig>,
    pub probes: Arc<[Arc<dyn HealthProbe>]>,
}

impl ApiState {
    #[must_use]
    pub fn new(config: Arc<AppConfig>, probes: Vec<Arc<dyn HealthProbe>>) -> Self {
        Self {
            config,
            probes: probes.into(),
        }
    }
}

pub struct ApiServer {
    state: ApiState,
}

impl ApiServer {
    #[must_use]
    pub const fn new(state: ApiState) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(health::liveness))
            .route("/health/ready", get(health::readiness))
            .route("/service-info", get(service_info::service_info))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Health API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
