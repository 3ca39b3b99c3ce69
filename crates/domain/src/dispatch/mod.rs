//! Command dispatch across the app, schema and content aggregates.
//!
//! A submitted [`DomainCommand`] is wrapped in a [`CommandContext`] and passed
//! along the handler chain. Handlers run cross-aggregate checks through the
//! [`lookups`](crate::lookups) traits before invoking the aggregate handler.

mod app;
mod content;
mod context;
mod dispatcher;
mod schema;

pub use app::AppCommandHandler;
pub use content::ContentCommandHandler;
pub use context::{CommandContext, CommandPayload, DomainCommand};
pub use dispatcher::{CommandDispatcher, CommandHandler, CommandResult};
pub use schema::SchemaCommandHandler;
