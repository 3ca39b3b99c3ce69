use std::sync::Arc;

use async_trait::async_trait;
use event_store::EventStore;

use crate::app::{App, AppCommand, client_lifetime};
use crate::error::{CommandError, DomainError};
use crate::handler::AggregateHandler;
use crate::lookups::{AppLookup, KeyGenerator, UserLookup};
use crate::validation::ValidationError;

use super::{CommandContext, CommandHandler, CommandPayload, DomainCommand};

/// Handles every [`AppCommand`].
pub struct AppCommandHandler<S> {
    handler: AggregateHandler<S>,
    apps: Arc<dyn AppLookup>,
    users: Arc<dyn UserLookup>,
    keys: Arc<dyn KeyGenerator>,
}

impl<S: EventStore> AppCommandHandler<S> {
    pub fn new(
        handler: AggregateHandler<S>,
        apps: Arc<dyn AppLookup>,
        users: Arc<dyn UserLookup>,
        keys: Arc<dyn KeyGenerator>,
    ) -> Self {
        Self {
            handler,
            apps,
            users,
            keys,
        }
    }

    async fn execute(
        &self,
        command: &AppCommand,
        context: &CommandContext,
    ) -> Result<CommandPayload, DomainError> {
        let handler = &self.handler;

        let result = match command {
            AppCommand::Create(c) => {
                if self.apps.find_by_name(&c.name).await.is_some() {
                    return Err(DomainError::validation(
                        "Cannot create app.",
                        ValidationError::new(
                            format!("An app with name '{}' already exists", c.name),
                            ["Name"],
                        ),
                    ));
                }

                let result = handler.create(c, |app: &App| app.create(c)).await?;
                return Ok(CommandPayload::Created {
                    id: c.app_id.into(),
                    version: result.new_version,
                });
            }
            AppCommand::AssignContributor(c) => {
                if !c.contributor_id.trim().is_empty()
                    && self.users.find_by_id(&c.contributor_id).await.is_none()
                {
                    return Err(DomainError::validation(
                        "Cannot assign contributor.",
                        ValidationError::new(
                            "Cannot find contributor the contributor.",
                            ["ContributorId"],
                        ),
                    ));
                }

                handler
                    .update(c, |app: &App| app.assign_contributor(c))
                    .await?
            }
            AppCommand::RemoveContributor(c) => {
                handler
                    .update(c, |app: &App| app.remove_contributor(c))
                    .await?
            }
            AppCommand::AttachClient(c) => {
                let secret = self.keys.generate_key();
                let expires = context.now() + client_lifetime();

                let result = handler
                    .update(c, |app: &App| app.attach_client(c, &secret, expires))
                    .await?;
                let client = result
                    .aggregate
                    .client(&c.id)
                    .cloned()
                    .ok_or_else(|| DomainError::not_found("Client", &c.id))?;
                return Ok(CommandPayload::Client(client));
            }
            AppCommand::RenameClient(c) => {
                handler.update(c, |app: &App| app.rename_client(c)).await?
            }
            AppCommand::RevokeClient(c) => {
                handler.update(c, |app: &App| app.revoke_client(c)).await?
            }
            AppCommand::AddLanguage(c) => {
                handler.update(c, |app: &App| app.add_language(c)).await?
            }
            AppCommand::RemoveLanguage(c) => {
                handler.update(c, |app: &App| app.remove_language(c)).await?
            }
            AppCommand::UpdateLanguage(c) => {
                handler.update(c, |app: &App| app.update_language(c)).await?
            }
            AppCommand::SetMasterLanguage(c) => {
                handler
                    .update(c, |app: &App| app.set_master_language(c))
                    .await?
            }
        };

        Ok(CommandPayload::Saved {
            version: result.new_version,
        })
    }
}

#[async_trait]
impl<S: EventStore> CommandHandler for AppCommandHandler<S> {
    async fn handle(&self, context: &mut CommandContext) -> Result<(), CommandError> {
        if context.is_handled() {
            return Ok(());
        }
        let DomainCommand::App(command) = context.command() else {
            return Ok(());
        };

        let payload = self.execute(command, context).await?;
        context.complete(payload)
    }
}
