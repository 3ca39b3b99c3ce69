//! Tracing and metrics setup for the binary.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Config, LogFormat};
use crate::error::{Result, RuntimeError};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when both are set.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| RuntimeError::Telemetry(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };
    installed.map_err(|e| RuntimeError::Telemetry(e.to_string()))
}

/// Installs the Prometheus recorder.
///
/// With a metrics address configured, an HTTP scrape listener is started and
/// no handle is returned. Without one, the returned handle renders the
/// metrics on demand.
pub fn install_metrics(config: &Config) -> Result<Option<PrometheusHandle>> {
    let builder = PrometheusBuilder::new();
    match config.metrics_addr {
        Some(addr) => {
            builder
                .with_http_listener(addr)
                .install()
                .map_err(|e| RuntimeError::Telemetry(e.to_string()))?;
            tracing::info!(%addr, "prometheus scrape listener started");
            Ok(None)
        }
        None => builder
            .install_recorder()
            .map(Some)
            .map_err(|e| RuntimeError::Telemetry(e.to_string())),
    }
}
