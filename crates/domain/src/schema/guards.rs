//! Invariant checks for schema commands.

use std::collections::HashSet;

use crate::error::DomainError;
use crate::validation::{Validator, is_slug};

use super::{AddField, CreateSchema, DeleteField, Field, Schema, UpdateField, ValidateProperties};

pub fn can_create(command: &CreateSchema) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if !is_slug(&command.name) {
        validator.error("Name must be a valid slug.", ["Name"]);
    }

    let mut names = HashSet::new();
    for (i, field) in command.fields.iter().enumerate() {
        if !is_slug(&field.name) {
            validator.error(
                "Field name must be a valid slug.",
                [format!("Fields[{i}].Name")],
            );
        }

        let prefix = format!("Fields[{i}].Properties.");
        validator.extend(
            field
                .properties
                .validate()
                .iter()
                .map(|e| e.with_prefix(&prefix)),
        );

        names.insert(field.name.as_str());
    }

    if names.len() != command.fields.len() {
        validator.error("Fields cannot have duplicate names.", ["Fields"]);
    }

    validator.finish("Cannot create schema.")
}

pub fn can_add_field(schema: &Schema, command: &AddField) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if !is_slug(&command.name) {
        validator.error("Name must be a valid slug.", ["Name"]);
    }

    if schema.fields().iter().any(|f| f.name == command.name) {
        validator.error("A field with the same name already exists.", ["Name"]);
    }

    validator.extend(
        command
            .properties
            .validate()
            .iter()
            .map(|e| e.with_prefix("Properties.")),
    );

    validator.finish("Cannot add a new field.")
}

pub fn can_update_field(schema: &Schema, command: &UpdateField) -> Result<(), DomainError> {
    let field = get_field_or_not_found(schema, command.field_id)?;

    let mut validator = Validator::new();

    if field.properties.kind() != command.properties.kind() {
        validator.error(
            format!("Field properties must be of kind {}.", field.properties.kind()),
            ["Properties"],
        );
    }

    validator.extend(
        command
            .properties
            .validate()
            .iter()
            .map(|e| e.with_prefix("Properties.")),
    );

    validator.finish("Cannot update field.")
}

pub fn can_delete_field(schema: &Schema, command: &DeleteField) -> Result<(), DomainError> {
    get_field_or_not_found(schema, command.field_id)?;
    Ok(())
}

pub fn can_publish(schema: &Schema) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if schema.is_published() {
        validator.message("Schema is already published.");
    }

    validator.finish("Cannot publish schema.")
}

pub fn can_unpublish(schema: &Schema) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if !schema.is_published() {
        validator.message("Schema is not published.");
    }

    validator.finish("Cannot unpublish schema.")
}

fn get_field_or_not_found(schema: &Schema, field_id: u32) -> Result<&Field, DomainError> {
    schema
        .field(field_id)
        .ok_or_else(|| DomainError::not_found("Field", field_id))
}
