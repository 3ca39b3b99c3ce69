//! Per-submission state shared along the handler chain.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::Serialize;

use crate::app::{AppClient, AppCommand};
use crate::content::ContentCommand;
use crate::error::CommandError;
use crate::schema::SchemaCommand;

/// Any command accepted by the dispatcher.
#[derive(Debug, Clone)]
pub enum DomainCommand {
    App(AppCommand),
    Schema(SchemaCommand),
    Content(ContentCommand),
}

impl DomainCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DomainCommand::App(c) => c.name(),
            DomainCommand::Schema(c) => c.name(),
            DomainCommand::Content(c) => c.name(),
        }
    }

    pub fn aggregate_id(&self) -> AggregateId {
        match self {
            DomainCommand::App(c) => c.app_id().into(),
            DomainCommand::Schema(c) => c.schema_id().into(),
            DomainCommand::Content(c) => c.content_id().into(),
        }
    }
}

impl From<AppCommand> for DomainCommand {
    fn from(command: AppCommand) -> Self {
        DomainCommand::App(command)
    }
}

impl From<SchemaCommand> for DomainCommand {
    fn from(command: SchemaCommand) -> Self {
        DomainCommand::Schema(command)
    }
}

impl From<ContentCommand> for DomainCommand {
    fn from(command: ContentCommand) -> Self {
        DomainCommand::Content(command)
    }
}

/// What a successful command hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandPayload {
    /// A new aggregate was created.
    Created { id: AggregateId, version: Version },
    /// A client was attached; carries the generated secret.
    Client(AppClient),
    Saved { version: Version },
}

/// A command on its way through the handler chain.
///
/// The context is completed by exactly one handler.
#[derive(Debug)]
pub struct CommandContext {
    command: DomainCommand,
    now: DateTime<Utc>,
    result: Option<CommandPayload>,
}

impl CommandContext {
    /// Captures the submission time used by every retry of the command.
    pub fn new(command: DomainCommand) -> Self {
        Self::at(command, Utc::now())
    }

    pub fn at(command: DomainCommand, now: DateTime<Utc>) -> Self {
        Self {
            command,
            now,
            result: None,
        }
    }

    pub fn command(&self) -> &DomainCommand {
        &self.command
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn is_handled(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&CommandPayload> {
        self.result.as_ref()
    }

    /// Marks the context as handled with the given payload.
    pub fn complete(&mut self, payload: CommandPayload) -> Result<(), CommandError> {
        if self.result.is_some() {
            return Err(CommandError::AlreadyHandled(self.command.name()));
        }
        self.result = Some(payload);
        Ok(())
    }

    pub fn into_result(self) -> Option<CommandPayload> {
        self.result
    }
}
