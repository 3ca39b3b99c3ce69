//! Schema commands.

use common::{AppId, SchemaId};
use event_store::Version;

use crate::command::{Actor, impl_command};

use super::{FieldDefinition, FieldId, FieldProperties, Schema};

/// Command to create a schema in an app.
#[derive(Debug, Clone)]
pub struct CreateSchema {
    pub schema_id: SchemaId,
    pub app_id: AppId,
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl CreateSchema {
    /// Creates the command with a generated schema id and no fields.
    pub fn new(actor: Actor, app_id: AppId, name: impl Into<String>) -> Self {
        Self {
            schema_id: SchemaId::new(),
            app_id,
            name: name.into(),
            fields: Vec::new(),
            actor,
            expected_version: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, properties: impl Into<FieldProperties>) -> Self {
        self.fields.push(FieldDefinition::new(name, properties));
        self
    }
}

#[derive(Debug, Clone)]
pub struct AddField {
    pub schema_id: SchemaId,
    pub name: String,
    pub properties: FieldProperties,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl AddField {
    pub fn new(
        actor: Actor,
        schema_id: SchemaId,
        name: impl Into<String>,
        properties: impl Into<FieldProperties>,
    ) -> Self {
        Self {
            schema_id,
            name: name.into(),
            properties: properties.into(),
            actor,
            expected_version: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateField {
    pub schema_id: SchemaId,
    pub field_id: FieldId,
    pub properties: FieldProperties,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl UpdateField {
    pub fn new(
        actor: Actor,
        schema_id: SchemaId,
        field_id: FieldId,
        properties: impl Into<FieldProperties>,
    ) -> Self {
        Self {
            schema_id,
            field_id,
            properties: properties.into(),
            actor,
            expected_version: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteField {
    pub schema_id: SchemaId,
    pub field_id: FieldId,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl DeleteField {
    pub fn new(actor: Actor, schema_id: SchemaId, field_id: FieldId) -> Self {
        Self {
            schema_id,
            field_id,
            actor,
            expected_version: None,
        }
    }
}

macro_rules! schema_command {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone)]
            pub struct $name {
                pub schema_id: SchemaId,
                pub actor: Actor,
                pub expected_version: Option<Version>,
            }

            impl $name {
                pub fn new(actor: Actor, schema_id: SchemaId) -> Self {
                    Self {
                        schema_id,
                        actor,
                        expected_version: None,
                    }
                }
            }
        )+
    };
}

schema_command!(
    PublishSchema,
    UnpublishSchema,
    /// Deletes the schema; later commands against it fail with not found.
    DeleteSchema,
);

impl_command!(Schema =>
    CreateSchema.schema_id,
    AddField.schema_id,
    UpdateField.schema_id,
    DeleteField.schema_id,
    PublishSchema.schema_id,
    UnpublishSchema.schema_id,
    DeleteSchema.schema_id,
);

/// Every command handled by the schema aggregate.
#[derive(Debug, Clone)]
pub enum SchemaCommand {
    Create(CreateSchema),
    AddField(AddField),
    UpdateField(UpdateField),
    DeleteField(DeleteField),
    Publish(PublishSchema),
    Unpublish(UnpublishSchema),
    Delete(DeleteSchema),
}

impl SchemaCommand {
    pub fn schema_id(&self) -> SchemaId {
        match self {
            SchemaCommand::Create(c) => c.schema_id,
            SchemaCommand::AddField(c) => c.schema_id,
            SchemaCommand::UpdateField(c) => c.schema_id,
            SchemaCommand::DeleteField(c) => c.schema_id,
            SchemaCommand::Publish(c) => c.schema_id,
            SchemaCommand::Unpublish(c) => c.schema_id,
            SchemaCommand::Delete(c) => c.schema_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SchemaCommand::Create(_) => "CreateSchema",
            SchemaCommand::AddField(_) => "AddField",
            SchemaCommand::UpdateField(_) => "UpdateField",
            SchemaCommand::DeleteField(_) => "DeleteField",
            SchemaCommand::Publish(_) => "PublishSchema",
            SchemaCommand::Unpublish(_) => "UnpublishSchema",
            SchemaCommand::Delete(_) => "DeleteSchema",
        }
    }
}
