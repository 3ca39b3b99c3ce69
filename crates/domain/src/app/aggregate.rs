//! App aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, AppId};
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::error::DomainError;

use super::{
    AddLanguage, AppClient, AppEvent, AssignContributor, AttachClient, Clients, Contributors,
    CreateApp, Language, LanguageConfig, LanguagesConfig, Permission, RemoveContributor,
    RemoveLanguage, RenameClient, RevokeClient, SetMasterLanguage, UpdateLanguage, guards,
};

/// App aggregate root: one tenant with its contributors, clients and languages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct App {
    id: Option<AppId>,
    version: Version,
    name: String,
    contributors: Contributors,
    clients: Clients,
    languages: LanguagesConfig,
}

impl Aggregate for App {
    type Event = AppEvent;

    fn aggregate_type() -> &'static str {
        "App"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id.map(Into::into)
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::AppCreated { app_id, name } => {
                self.id = Some(app_id);
                self.name = name;
                self.languages = LanguagesConfig::new(Language::en());
            }
            AppEvent::AppContributorAssigned {
                contributor_id,
                permission,
            } => {
                self.contributors.insert(contributor_id, permission);
            }
            AppEvent::AppContributorRemoved { contributor_id } => {
                self.contributors.remove(&contributor_id);
            }
            AppEvent::AppClientAttached {
                id,
                secret,
                expires,
            } => {
                let client = AppClient {
                    name: id.clone(),
                    id: id.clone(),
                    secret,
                    expires,
                };
                self.clients.insert(id, client);
            }
            AppEvent::AppClientRenamed { id, name } => {
                if let Some(client) = self.clients.get_mut(&id) {
                    client.name = name;
                }
            }
            AppEvent::AppClientRevoked { id } => {
                self.clients.remove(&id);
            }
            AppEvent::AppLanguageAdded { language } => {
                self.languages = self.languages.with_language(language);
            }
            AppEvent::AppLanguageRemoved { language } => {
                self.languages = self.languages.without_language(&language);
            }
            AppEvent::AppLanguageUpdated {
                language,
                is_optional,
                fallback,
            } => {
                let config = LanguageConfig::new(language)
                    .optional(is_optional)
                    .fallback(fallback);
                self.languages = self.languages.with_updated(config);
            }
            AppEvent::AppMasterLanguageSet { language } => {
                self.languages = self.languages.with_master(&language);
            }
        }
    }
}

// Query methods
impl App {
    pub fn app_id(&self) -> Option<AppId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contributors(&self) -> &Contributors {
        &self.contributors
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn client(&self, id: &str) -> Option<&AppClient> {
        self.clients.get(id)
    }

    pub fn languages(&self) -> &LanguagesConfig {
        &self.languages
    }
}

// Command methods (return events)
impl App {
    /// Creates the app. A user creating an app becomes its owner.
    pub fn create(&self, command: &CreateApp) -> Result<Vec<AppEvent>, DomainError> {
        guards::can_create(command)?;

        let mut events = vec![AppEvent::AppCreated {
            app_id: command.app_id,
            name: command.name.clone(),
        }];

        if let Some(user_id) = command.actor.user_id() {
            events.push(AppEvent::AppContributorAssigned {
                contributor_id: user_id.to_string(),
                permission: Permission::Owner,
            });
        }

        Ok(events)
    }

    pub fn assign_contributor(
        &self,
        command: &AssignContributor,
    ) -> Result<Vec<AppEvent>, DomainError> {
        guards::can_assign_contributor(&self.contributors, command)?;

        Ok(vec![AppEvent::AppContributorAssigned {
            contributor_id: command.contributor_id.clone(),
            permission: command.permission,
        }])
    }

    pub fn remove_contributor(
        &self,
        command: &RemoveContributor,
    ) -> Result<Vec<AppEvent>, DomainError> {
        guards::can_remove_contributor(&self.contributors, command)?;

        Ok(vec![AppEvent::AppContributorRemoved {
            contributor_id: command.contributor_id.clone(),
        }])
    }

    /// Attaches a client with a secret and expiry chosen by the caller.
    pub fn attach_client(
        &self,
        command: &AttachClient,
        secret: &str,
        expires: DateTime<Utc>,
    ) -> Result<Vec<AppEvent>, DomainError> {
        guards::can_attach_client(&self.clients, command)?;

        Ok(vec![AppEvent::AppClientAttached {
            id: command.id.clone(),
            secret: secret.to_string(),
            expires,
        }])
    }

    pub fn rename_client(&self, command: &RenameClient) -> Result<Vec<AppEvent>, DomainError> {
        guards::can_rename_client(&self.clients, command)?;

        Ok(vec![AppEvent::AppClientRenamed {
            id: command.id.clone(),
            name: command.name.clone(),
        }])
    }

    pub fn revoke_client(&self, command: &RevokeClient) -> Result<Vec<AppEvent>, DomainError> {
        guards::can_revoke_client(&self.clients, command)?;

        Ok(vec![AppEvent::AppClientRevoked {
            id: command.id.clone(),
        }])
    }

    pub fn add_language(&self, command: &AddLanguage) -> Result<Vec<AppEvent>, DomainError> {
        guards::can_add_language(&self.languages, command)?;

        Ok(command
            .language
            .iter()
            .map(|language| AppEvent::AppLanguageAdded {
                language: language.clone(),
            })
            .collect())
    }

    pub fn remove_language(&self, command: &RemoveLanguage) -> Result<Vec<AppEvent>, DomainError> {
        guards::can_remove_language(&self.languages, command)?;

        Ok(vec![AppEvent::AppLanguageRemoved {
            language: command.language.clone(),
        }])
    }

    /// Updates a language; with `is_master` it also becomes the master.
    pub fn update_language(&self, command: &UpdateLanguage) -> Result<Vec<AppEvent>, DomainError> {
        guards::can_update_language(&self.languages, command)?;

        let mut events = vec![AppEvent::AppLanguageUpdated {
            language: command.language.clone(),
            is_optional: command.is_optional,
            fallback: command.fallback.clone(),
        }];

        if command.is_master && !self.languages.is_master(&command.language) {
            events.push(AppEvent::AppMasterLanguageSet {
                language: command.language.clone(),
            });
        }

        Ok(events)
    }

    pub fn set_master_language(
        &self,
        command: &SetMasterLanguage,
    ) -> Result<Vec<AppEvent>, DomainError> {
        guards::can_set_master_language(&self.languages, command)?;

        if self.languages.is_master(&command.language) {
            return Ok(vec![]);
        }

        Ok(vec![AppEvent::AppMasterLanguageSet {
            language: command.language.clone(),
        }])
    }
}
