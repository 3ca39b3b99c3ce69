use std::sync::Arc;

use async_trait::async_trait;
use event_store::EventStore;

use crate::content::{Content, ContentCommand};
use crate::error::{CommandError, DomainError};
use crate::handler::AggregateHandler;
use crate::lookups::SchemaLookup;

use super::{CommandContext, CommandHandler, CommandPayload, DomainCommand};

/// Handles every [`ContentCommand`].
pub struct ContentCommandHandler<S> {
    handler: AggregateHandler<S>,
    schemas: Arc<dyn SchemaLookup>,
}

impl<S: EventStore> ContentCommandHandler<S> {
    pub fn new(handler: AggregateHandler<S>, schemas: Arc<dyn SchemaLookup>) -> Self {
        Self { handler, schemas }
    }

    async fn execute(
        &self,
        command: &ContentCommand,
        context: &CommandContext,
    ) -> Result<CommandPayload, DomainError> {
        let handler = &self.handler;

        let result = match command {
            ContentCommand::Create(c) => {
                let schema = self.schemas.get_schema(c.app_id, c.schema_id).await;
                if !schema.is_some_and(|s| !s.is_deleted) {
                    return Err(DomainError::not_found("Schema", c.schema_id));
                }

                let result = handler
                    .create(c, |content: &Content| content.create(c))
                    .await?;
                return Ok(CommandPayload::Created {
                    id: c.content_id.into(),
                    version: result.new_version,
                });
            }
            ContentCommand::Update(c) => {
                handler
                    .update(c, |content: &Content| content.update(c))
                    .await?
            }
            ContentCommand::Patch(c) => {
                handler
                    .update(c, |content: &Content| content.patch(c))
                    .await?
            }
            ContentCommand::ChangeStatus(c) => {
                let now = context.now();
                handler
                    .update(c, |content: &Content| content.change_status(c, now))
                    .await?
            }
            ContentCommand::Delete(c) => {
                handler
                    .update(c, |content: &Content| content.delete())
                    .await?
            }
        };

        Ok(CommandPayload::Saved {
            version: result.new_version,
        })
    }
}

#[async_trait]
impl<S: EventStore> CommandHandler for ContentCommandHandler<S> {
    async fn handle(&self, context: &mut CommandContext) -> Result<(), CommandError> {
        if context.is_handled() {
            return Ok(());
        }
        let DomainCommand::Content(command) = context.command() else {
            return Ok(());
        };

        let payload = self.execute(command, context).await?;
        context.complete(payload)
    }
}
