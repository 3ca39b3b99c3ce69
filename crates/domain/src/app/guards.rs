//! Invariant checks for app commands.
//!
//! Every guard evaluates all of its rules and fails once with the complete
//! list. References to members that must exist fail with `NotFound` first.

use crate::error::DomainError;
use crate::validation::{Validator, is_slug};

use super::contributors::{Contributors, is_only_owner};
use super::{
    AddLanguage, AssignContributor, AttachClient, Clients, CreateApp, LanguageConfig,
    LanguagesConfig, Permission, RemoveContributor, RemoveLanguage, RenameClient, RevokeClient,
    SetMasterLanguage, UpdateLanguage,
};

pub fn can_create(command: &CreateApp) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if !is_slug(&command.name) {
        validator.error("Name must be a valid slug.", ["Name"]);
    }

    validator.finish("Cannot create app.")
}

pub fn can_assign_contributor(
    contributors: &Contributors,
    command: &AssignContributor,
) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if command.contributor_id.trim().is_empty() {
        validator.error("Contributor id not assigned.", ["ContributorId"]);
    } else {
        if contributors.get(&command.contributor_id) == Some(&command.permission) {
            validator.error("Contributor has already this permission.", ["Permission"]);
        }

        if command.permission != Permission::Owner
            && is_only_owner(contributors, &command.contributor_id)
        {
            validator.error("Cannot change the permission of the only owner.", ["Permission"]);
        }
    }

    validator.finish("Cannot assign contributor.")
}

pub fn can_remove_contributor(
    contributors: &Contributors,
    command: &RemoveContributor,
) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if command.contributor_id.trim().is_empty() {
        validator.error("Contributor id not assigned.", ["ContributorId"]);
    } else if !contributors.contains_key(&command.contributor_id) {
        return Err(DomainError::not_found("Contributor", &command.contributor_id));
    } else if is_only_owner(contributors, &command.contributor_id) {
        validator.error("Cannot remove the only owner.", ["ContributorId"]);
    }

    validator.finish("Cannot remove contributor.")
}

pub fn can_attach_client(clients: &Clients, command: &AttachClient) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if command.id.trim().is_empty() {
        validator.error("Client id is required.", ["Id"]);
    } else if clients.contains_key(&command.id) {
        validator.error("A client with the same id already exists.", ["Id"]);
    }

    validator.finish("Cannot attach client.")
}

pub fn can_rename_client(clients: &Clients, command: &RenameClient) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if command.id.trim().is_empty() {
        validator.error("Client id is required.", ["Id"]);
    } else {
        let client = clients
            .get(&command.id)
            .ok_or_else(|| DomainError::not_found("Client", &command.id))?;

        if command.name.trim().is_empty() {
            validator.error("Client name is required.", ["Name"]);
        } else if client.name == command.name {
            validator.error("Client has already this name.", ["Name"]);
        }
    }

    validator.finish("Cannot rename client.")
}

pub fn can_revoke_client(clients: &Clients, command: &RevokeClient) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if command.id.trim().is_empty() {
        validator.error("Client id is required.", ["Id"]);
    } else if !clients.contains_key(&command.id) {
        return Err(DomainError::not_found("Client", &command.id));
    }

    validator.finish("Cannot revoke client.")
}

pub fn can_add_language(
    languages: &LanguagesConfig,
    command: &AddLanguage,
) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    match &command.language {
        None => validator.error("Language cannot be null.", ["Language"]),
        Some(language) if languages.contains(language) => {
            validator.error("Language already added.", ["Language"])
        }
        Some(_) => {}
    }

    validator.finish("Cannot add language.")
}

pub fn can_remove_language(
    languages: &LanguagesConfig,
    command: &RemoveLanguage,
) -> Result<(), DomainError> {
    get_config_or_not_found(languages, command)?;

    let mut validator = Validator::new();

    if languages.is_master(&command.language) {
        validator.error("Language config is master.", ["Language"]);
    }

    validator.finish("Cannot remove language.")
}

pub fn can_update_language(
    languages: &LanguagesConfig,
    command: &UpdateLanguage,
) -> Result<(), DomainError> {
    let language = &command.language;
    if !languages.contains(language) {
        return Err(DomainError::not_found("Language", language));
    }

    let mut validator = Validator::new();

    if (languages.is_master(language) || command.is_master) && command.is_optional {
        validator.error("Cannot make master language optional.", ["IsMaster"]);
    }

    for fallback in &command.fallback {
        if !languages.contains(fallback) {
            validator.error(
                format!("Config does not contain fallback language {fallback}."),
                ["Fallback"],
            );
        }
    }

    validator.finish("Cannot update language.")
}

pub fn can_set_master_language(
    languages: &LanguagesConfig,
    command: &SetMasterLanguage,
) -> Result<(), DomainError> {
    if !languages.contains(&command.language) {
        return Err(DomainError::not_found("Language", &command.language));
    }
    Ok(())
}

fn get_config_or_not_found<'a>(
    languages: &'a LanguagesConfig,
    command: &RemoveLanguage,
) -> Result<&'a LanguageConfig, DomainError> {
    languages
        .get(&command.language)
        .ok_or_else(|| DomainError::not_found("Language", &command.language))
}
