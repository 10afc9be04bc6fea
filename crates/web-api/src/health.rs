//! Liveness and readiness probes.
//!
//! `/health` only proves the process is serving requests. `/health/ready`
//! checks both stores on fresh connections and answers 503 if either fails.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::server::ApiState;

/// Outcome string reported for a dependency that answered.
pub const CONNECTED: &str = "connected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "healthy")]
    Healthy,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "not ready")]
    NotReady,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: Status,
    pub timestamp: DateTime<Utc>,
    /// Dependency name to `"connected"` or the captured error text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<BTreeMap<String, String>>,
}

/// GET /health - Always healthy while the process serves requests.
pub async fn liveness() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: Status::Healthy,
        timestamp: Utc::now(),
        checks: None,
    })
}

/// GET /health/ready - Checks every store dependency.
///
/// Returns `200` with `"ready"` when all checks pass, otherwise
/// `503 Service Unavailable` with `"not ready"`.
pub async fn readiness(State(state): State<ApiState>) -> (StatusCode, Json<HealthStatus>) {
    let results = join_all(state.probes.iter().map(|probe| async move {
        (probe.name(), probe.check().await)
    }))
    .await;

    let mut ready = true;
    let mut checks = BTreeMap::new();
    for (name, result) in results {
        let outcome = match result {
            Ok(()) => CONNECTED.to_string(),
            Err(e) => {
                tracing::warn!("Readiness check for {} failed: {}", name, e);
                ready = false;
                e
            }
        };
        checks.insert(name.to_string(), outcome);
    }

    let (code, status) = if ready {
        (StatusCode::OK, Status::Ready)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Status::NotReady)
    };

    (
        code,
        Json(HealthStatus {
            status,
            timestamp: Utc::now(),
            checks: Some(checks),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&Status::NotReady).unwrap(), "\"not ready\"");
        assert_eq!(serde_json::to_string(&Status::Ready).unwrap(), "\"ready\"");
    }

    #[tokio::test]
    async fn test_liveness_has_no_checks() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, Status::Healthy);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("checks").is_none());
        assert_eq!(json["status"], "healthy");
    }
}
