//! CMS entry point.

use std::sync::Arc;

use runtime::{Cms, Config, ContentScheduler, telemetry};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("invalid configuration");

    telemetry::init_tracing(&config).expect("failed to install tracing subscriber");
    let _metrics = telemetry::install_metrics(&config).expect("failed to install Prometheus recorder");

    let cms = Arc::new(Cms::from_config(&config).await.expect("failed to open event store"));
    cms.initialize().await.expect("initialization failed");

    let cancel = CancellationToken::new();
    let scheduler = ContentScheduler::new(cms.clone(), config.scheduler_interval);
    let worker = tokio::spawn({
        let cancel = cancel.clone();
        async move { scheduler.run(cancel).await }
    });

    tracing::info!(store = config.store.kind(), "cms running");
    shutdown_signal().await;

    cancel.cancel();
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "scheduler task failed");
    }

    tracing::info!("cms shut down gracefully");
}
