//! Write side of the CMS.
//!
//! This crate provides:
//! - the [`Aggregate`] and [`DomainEvent`] traits and the [`AggregateHandler`]
//!   that loads, mutates and appends aggregates with conflict retries
//! - the App, Schema and Content aggregates with their guards
//! - command dispatch with cross-aggregate checks through lookup traits

pub mod aggregate;
pub mod app;
pub mod command;
pub mod content;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod lookups;
pub mod schema;
pub mod validation;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{Actor, Command};
pub use dispatch::{
    AppCommandHandler, CommandContext, CommandDispatcher, CommandHandler, CommandPayload,
    CommandResult, ContentCommandHandler, DomainCommand, SchemaCommandHandler,
};
pub use error::{CommandError, DomainError};
pub use handler::{AggregateHandler, AggregateResult, DEFAULT_MAX_RETRIES};
pub use lookups::{
    AppEntity, AppLookup, KeyGenerator, RandomKeyGenerator, SchemaEntity, SchemaLookup, User,
    UserLookup,
};
pub use validation::{ValidationError, Validator};
