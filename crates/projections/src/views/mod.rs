//! Read model views over the App and Schema streams.

pub mod apps;
pub mod schemas;

pub use apps::AppsView;
pub use schemas::SchemasView;
