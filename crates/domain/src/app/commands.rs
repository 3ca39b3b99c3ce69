//! App commands.

use common::AppId;
use event_store::Version;

use crate::command::{Actor, impl_command};

use super::{App, Language, Permission};

/// Command to create a new app.
#[derive(Debug, Clone)]
pub struct CreateApp {
    pub app_id: AppId,
    pub name: String,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl CreateApp {
    /// Creates the command with a generated app id.
    pub fn new(actor: Actor, name: impl Into<String>) -> Self {
        Self {
            app_id: AppId::new(),
            name: name.into(),
            actor,
            expected_version: None,
        }
    }
}

/// Command to add a contributor or change their permission.
#[derive(Debug, Clone)]
pub struct AssignContributor {
    pub app_id: AppId,
    pub contributor_id: String,
    pub permission: Permission,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl AssignContributor {
    pub fn new(
        actor: Actor,
        app_id: AppId,
        contributor_id: impl Into<String>,
        permission: Permission,
    ) -> Self {
        Self {
            app_id,
            contributor_id: contributor_id.into(),
            permission,
            actor,
            expected_version: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoveContributor {
    pub app_id: AppId,
    pub contributor_id: String,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl RemoveContributor {
    pub fn new(actor: Actor, app_id: AppId, contributor_id: impl Into<String>) -> Self {
        Self {
            app_id,
            contributor_id: contributor_id.into(),
            actor,
            expected_version: None,
        }
    }
}

/// Command to attach an API client. The secret is generated by the handler.
#[derive(Debug, Clone)]
pub struct AttachClient {
    pub app_id: AppId,
    pub id: String,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl AttachClient {
    pub fn new(actor: Actor, app_id: AppId, id: impl Into<String>) -> Self {
        Self {
            app_id,
            id: id.into(),
            actor,
            expected_version: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenameClient {
    pub app_id: AppId,
    pub id: String,
    pub name: String,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl RenameClient {
    pub fn new(actor: Actor, app_id: AppId, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_id,
            id: id.into(),
            name: name.into(),
            actor,
            expected_version: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RevokeClient {
    pub app_id: AppId,
    pub id: String,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl RevokeClient {
    pub fn new(actor: Actor, app_id: AppId, id: impl Into<String>) -> Self {
        Self {
            app_id,
            id: id.into(),
            actor,
            expected_version: None,
        }
    }
}

/// Command to add a language. `None` is rejected by the guard.
#[derive(Debug, Clone)]
pub struct AddLanguage {
    pub app_id: AppId,
    pub language: Option<Language>,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl AddLanguage {
    pub fn new(actor: Actor, app_id: AppId, language: impl Into<Language>) -> Self {
        Self {
            app_id,
            language: Some(language.into()),
            actor,
            expected_version: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoveLanguage {
    pub app_id: AppId,
    pub language: Language,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl RemoveLanguage {
    pub fn new(actor: Actor, app_id: AppId, language: impl Into<Language>) -> Self {
        Self {
            app_id,
            language: language.into(),
            actor,
            expected_version: None,
        }
    }
}

/// Command to change the settings of a configured language.
#[derive(Debug, Clone)]
pub struct UpdateLanguage {
    pub app_id: AppId,
    pub language: Language,
    pub is_optional: bool,
    pub is_master: bool,
    pub fallback: Vec<Language>,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl UpdateLanguage {
    pub fn new(actor: Actor, app_id: AppId, language: impl Into<Language>) -> Self {
        Self {
            app_id,
            language: language.into(),
            is_optional: false,
            is_master: false,
            fallback: Vec::new(),
            actor,
            expected_version: None,
        }
    }

    pub fn optional(mut self, is_optional: bool) -> Self {
        self.is_optional = is_optional;
        self
    }

    pub fn master(mut self, is_master: bool) -> Self {
        self.is_master = is_master;
        self
    }

    pub fn fallback<I, L>(mut self, fallback: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Language>,
    {
        self.fallback = fallback.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone)]
pub struct SetMasterLanguage {
    pub app_id: AppId,
    pub language: Language,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl SetMasterLanguage {
    pub fn new(actor: Actor, app_id: AppId, language: impl Into<Language>) -> Self {
        Self {
            app_id,
            language: language.into(),
            actor,
            expected_version: None,
        }
    }
}

impl_command!(App =>
    CreateApp.app_id,
    AssignContributor.app_id,
    RemoveContributor.app_id,
    AttachClient.app_id,
    RenameClient.app_id,
    RevokeClient.app_id,
    AddLanguage.app_id,
    RemoveLanguage.app_id,
    UpdateLanguage.app_id,
    SetMasterLanguage.app_id,
);

/// Every command handled by the app aggregate.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Create(CreateApp),
    AssignContributor(AssignContributor),
    RemoveContributor(RemoveContributor),
    AttachClient(AttachClient),
    RenameClient(RenameClient),
    RevokeClient(RevokeClient),
    AddLanguage(AddLanguage),
    RemoveLanguage(RemoveLanguage),
    UpdateLanguage(UpdateLanguage),
    SetMasterLanguage(SetMasterLanguage),
}

impl AppCommand {
    pub fn app_id(&self) -> AppId {
        match self {
            AppCommand::Create(c) => c.app_id,
            AppCommand::AssignContributor(c) => c.app_id,
            AppCommand::RemoveContributor(c) => c.app_id,
            AppCommand::AttachClient(c) => c.app_id,
            AppCommand::RenameClient(c) => c.app_id,
            AppCommand::RevokeClient(c) => c.app_id,
            AppCommand::AddLanguage(c) => c.app_id,
            AppCommand::RemoveLanguage(c) => c.app_id,
            AppCommand::UpdateLanguage(c) => c.app_id,
            AppCommand::SetMasterLanguage(c) => c.app_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppCommand::Create(_) => "CreateApp",
            AppCommand::AssignContributor(_) => "AssignContributor",
            AppCommand::RemoveContributor(_) => "RemoveContributor",
            AppCommand::AttachClient(_) => "AttachClient",
            AppCommand::RenameClient(_) => "RenameClient",
            AppCommand::RevokeClient(_) => "RevokeClient",
            AppCommand::AddLanguage(_) => "AddLanguage",
            AppCommand::RemoveLanguage(_) => "RemoveLanguage",
            AppCommand::UpdateLanguage(_) => "UpdateLanguage",
            AppCommand::SetMasterLanguage(_) => "SetMasterLanguage",
        }
    }
}
