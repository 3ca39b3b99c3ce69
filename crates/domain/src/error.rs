//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The command violates one or more invariants. Nothing was appended.
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<ValidationError>,
    },

    /// An aggregate, or a member referenced by the command, does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A create command targeted a stream that already has events.
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Builds a validation failure with a single error.
    pub fn validation(message: impl Into<String>, error: ValidationError) -> Self {
        DomainError::Validation {
            message: message.into(),
            errors: vec![error],
        }
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Returns true for an optimistic concurrency failure from the store.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::EventStore(e) if e.is_conflict())
    }

    /// Returns true for failures the caller can fix by changing the command.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DomainError::Validation { .. }
                | DomainError::NotFound { .. }
                | DomainError::AlreadyExists { .. }
        )
    }
}

/// Failures of a submitted command that are not reported as a [`CommandResult`].
///
/// [`CommandResult`]: crate::dispatch::CommandResult
#[derive(Debug, Error)]
pub enum CommandError {
    /// No handler in the chain accepted the command.
    #[error("No handler accepted command {0}")]
    NotHandled(&'static str),

    /// A handler tried to complete a context that was already completed.
    #[error("Command {0} was handled more than once")]
    AlreadyHandled(&'static str),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<EventStoreError> for CommandError {
    fn from(e: EventStoreError) -> Self {
        CommandError::Domain(e.into())
    }
}
