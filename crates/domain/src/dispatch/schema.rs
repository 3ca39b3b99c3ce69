use std::sync::Arc;

use async_trait::async_trait;
use event_store::EventStore;

use crate::error::{CommandError, DomainError};
use crate::handler::AggregateHandler;
use crate::lookups::{AppLookup, SchemaLookup};
use crate::schema::{Schema, SchemaCommand};
use crate::validation::ValidationError;

use super::{CommandContext, CommandHandler, CommandPayload, DomainCommand};

/// Handles every [`SchemaCommand`].
pub struct SchemaCommandHandler<S> {
    handler: AggregateHandler<S>,
    apps: Arc<dyn AppLookup>,
    schemas: Arc<dyn SchemaLookup>,
}

impl<S: EventStore> SchemaCommandHandler<S> {
    pub fn new(
        handler: AggregateHandler<S>,
        apps: Arc<dyn AppLookup>,
        schemas: Arc<dyn SchemaLookup>,
    ) -> Self {
        Self {
            handler,
            apps,
            schemas,
        }
    }

    async fn execute(&self, command: &SchemaCommand) -> Result<CommandPayload, DomainError> {
        let handler = &self.handler;

        let result = match command {
            SchemaCommand::Create(c) => {
                if self.apps.find_by_id(c.app_id).await.is_none() {
                    return Err(DomainError::not_found("App", c.app_id));
                }

                if self.schemas.find_by_name(c.app_id, &c.name).await.is_some() {
                    return Err(DomainError::validation(
                        "Cannot create schema.",
                        ValidationError::new(
                            format!("A schema with name '{}' already exists.", c.name),
                            ["Name"],
                        ),
                    ));
                }

                let result = handler.create(c, |schema: &Schema| schema.create(c)).await?;
                return Ok(CommandPayload::Created {
                    id: c.schema_id.into(),
                    version: result.new_version,
                });
            }
            SchemaCommand::AddField(c) => {
                handler.update(c, |schema: &Schema| schema.add_field(c)).await?
            }
            SchemaCommand::UpdateField(c) => {
                handler
                    .update(c, |schema: &Schema| schema.update_field(c))
                    .await?
            }
            SchemaCommand::DeleteField(c) => {
                handler
                    .update(c, |schema: &Schema| schema.delete_field(c))
                    .await?
            }
            SchemaCommand::Publish(c) => handler.update(c, |schema: &Schema| schema.publish()).await?,
            SchemaCommand::Unpublish(c) => {
                handler.update(c, |schema: &Schema| schema.unpublish()).await?
            }
            SchemaCommand::Delete(c) => handler.update(c, |schema: &Schema| schema.delete()).await?,
        };

        Ok(CommandPayload::Saved {
            version: result.new_version,
        })
    }
}

#[async_trait]
impl<S: EventStore> CommandHandler for SchemaCommandHandler<S> {
    async fn handle(&self, context: &mut CommandContext) -> Result<(), CommandError> {
        if context.is_handled() {
            return Ok(());
        }
        let DomainCommand::Schema(command) = context.command() else {
            return Ok(());
        };

        let payload = self.execute(command).await?;
        context.complete(payload)
    }
}
