//! Schema domain events.

use common::{AppId, SchemaId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{FieldDefinition, FieldId, FieldProperties};

/// Events that can occur on a schema aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SchemaEvent {
    /// Schema was created; its fields get ids `1..=fields.len()`.
    SchemaCreated {
        schema_id: SchemaId,
        app_id: AppId,
        name: String,
        fields: Vec<FieldDefinition>,
    },

    SchemaFieldAdded {
        field_id: FieldId,
        name: String,
        properties: FieldProperties,
    },

    SchemaFieldUpdated {
        field_id: FieldId,
        properties: FieldProperties,
    },

    SchemaFieldDeleted { field_id: FieldId },

    SchemaPublished,

    SchemaUnpublished,

    SchemaDeleted,
}

impl DomainEvent for SchemaEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SchemaEvent::SchemaCreated { .. } => "SchemaCreated",
            SchemaEvent::SchemaFieldAdded { .. } => "SchemaFieldAdded",
            SchemaEvent::SchemaFieldUpdated { .. } => "SchemaFieldUpdated",
            SchemaEvent::SchemaFieldDeleted { .. } => "SchemaFieldDeleted",
            SchemaEvent::SchemaPublished => "SchemaPublished",
            SchemaEvent::SchemaUnpublished => "SchemaUnpublished",
            SchemaEvent::SchemaDeleted => "SchemaDeleted",
        }
    }
}
