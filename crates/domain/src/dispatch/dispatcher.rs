use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{CommandError, DomainError};
use crate::validation::ValidationError;

use super::{CommandContext, CommandPayload, DomainCommand};

/// One link in the dispatcher's handler chain.
///
/// A handler ignores contexts that are already handled or carry a command it
/// does not own, and completes the rest.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, context: &mut CommandContext) -> Result<(), CommandError>;
}

/// Outcome of a submitted command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResult {
    pub succeeded: bool,
    pub payload: Option<CommandPayload>,
    pub message: Option<String>,
    pub errors: Vec<ValidationError>,
}

impl CommandResult {
    pub fn success(payload: CommandPayload) -> Self {
        Self {
            succeeded: true,
            payload: Some(payload),
            message: None,
            errors: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Self {
            succeeded: false,
            payload: None,
            message: Some(message.into()),
            errors,
        }
    }

    /// Converts a rejection the caller can act on; other errors are returned.
    fn from_error(error: DomainError) -> Result<Self, DomainError> {
        match error {
            DomainError::Validation { message, errors } => Ok(Self::failure(message, errors)),
            e @ (DomainError::NotFound { kind, .. } | DomainError::AlreadyExists { kind, .. }) => {
                let message = e.to_string();
                Ok(Self::failure(
                    message.clone(),
                    vec![ValidationError::new(message, [kind])],
                ))
            }
            e => Err(e),
        }
    }
}

/// Runs submitted commands through an ordered chain of handlers.
#[derive(Clone)]
pub struct CommandDispatcher {
    handlers: Vec<Arc<dyn CommandHandler>>,
}

impl CommandDispatcher {
    pub fn new(handlers: Vec<Arc<dyn CommandHandler>>) -> Self {
        Self { handlers }
    }

    /// Submits a command.
    ///
    /// Validation, not-found and already-exists failures are reported in the
    /// returned [`CommandResult`]; exhausted conflicts and store failures are
    /// errors.
    #[tracing::instrument(
        skip_all,
        fields(command = command.name(), aggregate_id = %command.aggregate_id())
    )]
    pub async fn submit(&self, command: DomainCommand) -> Result<CommandResult, CommandError> {
        metrics::counter!("commands_submitted", "command" => command.name()).increment(1);

        let name = command.name();
        let mut context = CommandContext::new(command);

        match self.dispatch(&mut context).await {
            Ok(()) => {}
            Err(CommandError::Domain(e)) if e.is_user_error() => {
                metrics::counter!("commands_rejected", "command" => name).increment(1);
                tracing::info!(error = %e, "command rejected");
                return Ok(CommandResult::from_error(e)?);
            }
            Err(e) => {
                tracing::error!(error = %e, "command failed");
                return Err(e);
            }
        }

        match context.into_result() {
            Some(payload) => Ok(CommandResult::success(payload)),
            None => Err(CommandError::NotHandled(name)),
        }
    }

    async fn dispatch(&self, context: &mut CommandContext) -> Result<(), CommandError> {
        for handler in &self.handlers {
            handler.handle(context).await?;
        }
        Ok(())
    }
}
