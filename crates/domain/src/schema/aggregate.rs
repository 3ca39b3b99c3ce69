//! Schema aggregate implementation.

use common::{AggregateId, AppId, SchemaId};
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::error::DomainError;

use super::{
    AddField, CreateSchema, DeleteField, Field, FieldId, SchemaEvent, UpdateField, guards,
};

/// Schema aggregate root: the content model of one type of content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    id: Option<SchemaId>,
    app_id: Option<AppId>,
    version: Version,
    name: String,
    fields: Vec<Field>,
    last_field_id: FieldId,
    is_published: bool,
    is_deleted: bool,
}

impl Aggregate for Schema {
    type Event = SchemaEvent;

    fn aggregate_type() -> &'static str {
        "Schema"
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

    fn apply(&mut self, event: SchemaEvent) {
        match event {
            SchemaEvent::SchemaCreated {
                schema_id,
                app_id,
                name,
                fields,
            } => {
                self.id = Some(schema_id);
                self.app_id = Some(app_id);
                self.name = name;
                for definition in fields {
                    self.last_field_id += 1;
                    self.fields.push(Field {
                        id: self.last_field_id,
                        name: definition.name,
                        properties: definition.properties,
                    });
                }
            }
            SchemaEvent::SchemaFieldAdded {
                field_id,
                name,
                properties,
            } => {
                self.last_field_id = self.last_field_id.max(field_id);
                self.fields.push(Field {
                    id: field_id,
                    name,
                    properties,
                });
            }
            SchemaEvent::SchemaFieldUpdated {
                field_id,
                properties,
            } => {
                if let Some(field) = self.fields.iter_mut().find(|f| f.id == field_id) {
                    field.properties = properties;
                }
            }
            SchemaEvent::SchemaFieldDeleted { field_id } => {
                self.fields.retain(|f| f.id != field_id);
            }
            SchemaEvent::SchemaPublished => self.is_published = true,
            SchemaEvent::SchemaUnpublished => self.is_published = false,
            SchemaEvent::SchemaDeleted => self.is_deleted = true,
        }
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

// Query methods
impl Schema {
    pub fn schema_id(&self) -> Option<SchemaId> {
        self.id
    }

    pub fn app_id(&self) -> Option<AppId> {
        self.app_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }
}

// Command methods (return events)
impl Schema {
    pub fn create(&self, command: &CreateSchema) -> Result<Vec<SchemaEvent>, DomainError> {
        guards::can_create(command)?;

        Ok(vec![SchemaEvent::SchemaCreated {
            schema_id: command.schema_id,
            app_id: command.app_id,
            name: command.name.clone(),
            fields: command.fields.clone(),
        }])
    }

    pub fn add_field(&self, command: &AddField) -> Result<Vec<SchemaEvent>, DomainError> {
        guards::can_add_field(self, command)?;

        Ok(vec![SchemaEvent::SchemaFieldAdded {
            field_id: self.last_field_id + 1,
            name: command.name.clone(),
            properties: command.properties.clone(),
        }])
    }

    pub fn update_field(&self, command: &UpdateField) -> Result<Vec<SchemaEvent>, DomainError> {
        guards::can_update_field(self, command)?;

        Ok(vec![SchemaEvent::SchemaFieldUpdated {
            field_id: command.field_id,
            properties: command.properties.clone(),
        }])
    }

    pub fn delete_field(&self, command: &DeleteField) -> Result<Vec<SchemaEvent>, DomainError> {
        guards::can_delete_field(self, command)?;

        Ok(vec![SchemaEvent::SchemaFieldDeleted {
            field_id: command.field_id,
        }])
    }

    pub fn publish(&self) -> Result<Vec<SchemaEvent>, DomainError> {
        guards::can_publish(self)?;
        Ok(vec![SchemaEvent::SchemaPublished])
    }

    pub fn unpublish(&self) -> Result<Vec<SchemaEvent>, DomainError> {
        guards::can_unpublish(self)?;
        Ok(vec![SchemaEvent::SchemaUnpublished])
    }

    pub fn delete(&self) -> Result<Vec<SchemaEvent>, DomainError> {
        Ok(vec![SchemaEvent::SchemaDeleted])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Actor;
    use crate::schema::{NumberFieldProperties, StringFieldProperties};

    fn blog_schema() -> Schema {
        let command = CreateSchema::new(Actor::subject("me"), AppId::new(), "posts")
            .field("title", StringFieldProperties::default())
            .field("rating", NumberFieldProperties::default());
        Schema::replay(Schema::default().create(&command).unwrap())
    }

    #[test]
    fn test_created_fields_get_sequential_ids() {
        let schema = blog_schema();

        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.field(1).unwrap().name, "title");
        assert_eq!(schema.field(2).unwrap().name, "rating");
    }

    #[test]
    fn test_field_ids_are_not_reused_after_delete() {
        let mut schema = blog_schema();
        let id = schema.schema_id().unwrap();
        let me = Actor::subject("me");

        schema.apply_events(
            schema
                .delete_field(&DeleteField::new(me.clone(), id, 2))
                .unwrap(),
        );
        let events = schema
            .add_field(&AddField::new(me, id, "summary", StringFieldProperties::default()))
            .unwrap();

        assert!(matches!(events[0], SchemaEvent::SchemaFieldAdded { field_id: 3, .. }));
    }

    #[test]
    fn test_duplicate_field_name_is_rejected() {
        let schema = blog_schema();
        let command = AddField::new(
            Actor::subject("me"),
            schema.schema_id().unwrap(),
            "title",
            StringFieldProperties::default(),
        );

        assert!(matches!(
            schema.add_field(&command),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn test_publish_flow() {
        let mut schema = blog_schema();
        assert!(schema.unpublish().is_err());

        schema.apply_events(schema.publish().unwrap());
        assert!(schema.is_published());
        assert!(schema.publish().is_err());

        schema.apply_events(schema.unpublish().unwrap());
        assert!(!schema.is_published());
    }

    #[test]
    fn test_delete_marks_schema_deleted() {
        let mut schema = blog_schema();
        schema.apply_events(schema.delete().unwrap());
        assert!(schema.is_deleted());
    }
}
