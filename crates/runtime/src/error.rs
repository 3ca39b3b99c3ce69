//! Runtime error types.

use domain::CommandError;
use event_store::EventStoreError;
use projections::ProjectionError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while wiring or running the CMS.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Telemetry setup failed: {0}")]
    Telemetry(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
