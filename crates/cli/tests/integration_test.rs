use analytics_core::{AppConfig, HealthProbe, RawSample, UserId};
use analytics_data::{MemoryProbe, MemorySink, MemorySource};
use analytics_sync::{CycleOutcome, SyncScheduler};
use analytics_web_api::{ApiServer, ApiState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn test_cycle_and_health_surface_share_only_config() {
    let config = Arc::new(AppConfig::default());

    let source = Arc::new(MemorySource::new(vec![
        RawSample::new("u1", 10.0),
        RawSample::new("u1", 20.0),
        RawSample::new("u1", 30.0),
        RawSample::new("u2", 5.0),
    ]));
    let sink = Arc::new(MemorySink::new());
    let scheduler = SyncScheduler::new(config.sync.clone(), source, Arc::clone(&sink));

    let probes: Vec<Arc<dyn HealthProbe>> = vec![
        Arc::new(MemoryProbe::healthy("mysql")),
        Arc::new(MemoryProbe::failing("mongodb", "sink unavailable: auth failed")),
    ];
    let router = ApiServer::new(ApiState::new(Arc::clone(&config), probes)).router();

    let request = Request::builder()
        .uri("/health/ready")
        .body(Body::empty())
        .unwrap();
    let (report, response) = tokio::join!(scheduler.run_once(), router.oneshot(request));

    assert_eq!(report.outcome(), CycleOutcome::Succeeded);
    assert_eq!(response.unwrap().status(), StatusCode::SERVICE_UNAVAILABLE);

    let docs = sink.documents().await;
    assert_eq!(docs[&UserId::new("u1")].avg, 20.0);
    assert_eq!(docs[&UserId::new("u2")].count, 1);
}
