//! Long-running service: sync loop plus health API.

use analytics_core::{AppConfig, HealthProbe};
use analytics_data::Repositories;
use analytics_sync::SyncScheduler;
use analytics_web_api::{ApiServer, ApiState};
use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Runs the sync loop and the HTTP server until SIGINT/SIGTERM.
///
/// # Errors
/// Returns an error if the server cannot bind or signal handlers cannot be installed.
pub async fn run_service(config: AppConfig) -> Result<()> {
    let config = Arc::new(config);
    let repos = Repositories::new(&config);

    let stats = repos.stats.clone();
    tokio::spawn(async move {
        if let Err(e) = stats.ensure_indexes().await {
            tracing::warn!("Could not ensure analytics indexes: {}", e);
        }
    });

    let source = Arc::new(repos.samples);
    let sink = Arc::new(repos.stats);

    let scheduler = SyncScheduler::new(config.sync.clone(), Arc::clone(&source), Arc::clone(&sink));
    let sync_handle = tokio::spawn(scheduler.start());

    let probes: Vec<Arc<dyn HealthProbe>> = vec![source, sink];
    let server_handle = spawn_server(Arc::clone(&config), probes);

    let result = wait_for_exit(server_handle).await;
    sync_handle.abort();

    tracing::info!("Analytics service stopped");
    result
}

/// Runs only the HTTP server.
///
/// # Errors
/// Returns an error if the server cannot bind or signal handlers cannot be installed.
pub async fn run_serve(config: AppConfig) -> Result<()> {
    let config = Arc::new(config);
    let repos = Repositories::new(&config);
    let probes: Vec<Arc<dyn HealthProbe>> = vec![Arc::new(repos.samples), Arc::new(repos.stats)];

    wait_for_exit(spawn_server(config, probes)).await
}

fn spawn_server(config: Arc<AppConfig>, probes: Vec<Arc<dyn HealthProbe>>) -> JoinHandle<Result<()>> {
    let addr = config.server.addr();
    let server = ApiServer::new(ApiState::new(config, probes));
    tokio::spawn(async move { server.serve(&addr).await })
}

/// Waits for a shutdown signal, or for the server task to end on its own.
async fn wait_for_exit(mut server_handle: JoinHandle<Result<()>>) -> Result<()> {
    let result = tokio::select! {
        signal = shutdown_signal() => signal,
        joined = &mut server_handle => match joined {
            Ok(served) => served,
            Err(e) => Err(e.into()),
        },
    };
    server_handle.abort();
    result
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C, initiating shutdown");
    }

    Ok(())
}
