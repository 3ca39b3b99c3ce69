//! Append-only event log with per-stream optimistic concurrency.
//!
//! - [`EventStore`] is the contract every backend implements
//! - [`InMemoryEventStore`] keeps streams in process memory
//! - [`PostgresEventStore`] persists streams in PostgreSQL

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{ACTOR_METADATA_KEY, EventEnvelope, EventEnvelopeBuilder, EventId, Position, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{EventStore, EventStoreExt, EventStream, validate_batch};
