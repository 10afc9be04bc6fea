//! Service discovery descriptor.

use analytics_core::mask_credentials;
use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::server::ApiState;

#[derive(Debug, Clone, Serialize)]
pub struct EndpointInfo {
    pub path: &'static str,
    pub method: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyInfo {
    /// Connection locator with the password masked.
    pub uri: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
    pub dependencies: BTreeMap<&'static str, DependencyInfo>,
}

pub const ENDPOINTS: [EndpointInfo; 3] = [
    EndpointInfo {
        path: "/health",
        method: "GET",
        description: "Liveness probe",
    },
    EndpointInfo {
        path: "/health/ready",
        method: "GET",
        description: "Readiness probe",
    },
    EndpointInfo {
        path: "/service-info",
        method: "GET",
        description: "Service discovery information",
    },
];

/// GET /service-info - Static endpoint list and masked dependency locators.
pub async fn service_info(State(state): State<ApiState>) -> Json<ServiceInfo> {
    let config = &state.config;
    let dependencies = BTreeMap::from([
        (
            "mysql",
            DependencyInfo {
                uri: mask_credentials(&config.source.locator()),
            },
        ),
        (
            "mongodb",
            DependencyInfo {
                uri: mask_credentials(&config.sink.locator()),
            },
        ),
    ]);

    Json(ServiceInfo {
        name: "analytics-service",
        version: env!("CARGO_PKG_VERSION"),
        description: "Computes per-user statistics from raw MySQL rows and stores them in MongoDB",
        endpoints: ENDPOINTS.to_vec(),
        dependencies,
    })
}
