//! Runtime of the CMS.
//!
//! Wires the event store, command handlers and read models into a [`Cms`],
//! loads [`Config`] from the environment, sets up tracing and Prometheus
//! metrics, and runs the [`ContentScheduler`].

pub mod cms;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod telemetry;
pub mod users;

pub use cms::{Cms, SharedStore};
pub use config::{Config, ConfigError, LogFormat, StoreConfig};
pub use error::{Result, RuntimeError};
pub use scheduler::ContentScheduler;
pub use users::InMemoryUserDirectory;
