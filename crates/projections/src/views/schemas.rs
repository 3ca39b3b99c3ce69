//! Schemas read model, also serving schema lookups for command handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AppId, SchemaId};
use domain::schema::{Schema, SchemaEvent};
use domain::{Aggregate, SchemaEntity, SchemaLookup};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Read model of every schema, deleted ones included.
#[derive(Clone, Default)]
pub struct SchemasView {
    schemas: Arc<RwLock<HashMap<SchemaId, Schema>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl SchemasView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the full schema with its fields.
    pub async fn get_full_schema(&self, schema_id: SchemaId) -> Option<Schema> {
        self.schemas.read().await.get(&schema_id).cloned()
    }

    /// Returns the schemas of an app that are not deleted, ordered by name.
    pub async fn schemas_for_app(&self, app_id: AppId) -> Vec<SchemaEntity> {
        let mut schemas: Vec<_> = self
            .schemas
            .read()
            .await
            .values()
            .filter(|s| s.app_id() == Some(app_id) && !s.is_deleted())
            .filter_map(to_entity)
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }
}

fn to_entity(schema: &Schema) -> Option<SchemaEntity> {
    Some(SchemaEntity {
        id: schema.schema_id()?,
        app_id: schema.app_id()?,
        name: schema.name().to_string(),
        version: schema.version(),
        is_published: schema.is_published(),
        is_deleted: schema.is_deleted(),
    })
}

#[async_trait]
impl SchemaLookup for SchemasView {
    async fn get_schema(&self, app_id: AppId, schema_id: SchemaId) -> Option<SchemaEntity> {
        self.schemas
            .read()
            .await
            .get(&schema_id)
            .filter(|s| s.app_id() == Some(app_id))
            .and_then(to_entity)
    }

    async fn find_by_name(&self, app_id: AppId, name: &str) -> Option<SchemaEntity> {
        self.schemas
            .read()
            .await
            .values()
            .find(|s| s.app_id() == Some(app_id) && s.name() == name && !s.is_deleted())
            .and_then(to_entity)
    }
}

#[async_trait]
impl Projection for SchemasView {
    fn name(&self) -> &'static str {
        "SchemasView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type == Schema::aggregate_type() {
            let schema_event: SchemaEvent = serde_json::from_value(event.payload.clone())?;
            let schema_id = SchemaId::from_uuid(event.stream_id.as_uuid());

            let mut schemas = self.schemas.write().await;
            let schema = schemas.entry(schema_id).or_default();
            if event.version > schema.version() {
                schema.apply(schema_event);
                schema.set_version(event.version);
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance(event.position);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.schemas.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for SchemasView {
    fn name(&self) -> &'static str {
        "SchemasView"
    }

    fn count(&self) -> usize {
        self.schemas.try_read().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use domain::Actor;
    use domain::schema::{CreateSchema, StringFieldProperties};
    use event_store::{Position, Version};

    use super::*;

    fn envelope(schema_id: SchemaId, version: i64, event: &SchemaEvent) -> EventEnvelope {
        let mut envelope = EventEnvelope::builder()
            .stream_id(schema_id)
            .aggregate_type("Schema")
            .event_type(domain::DomainEvent::event_type(event))
            .version(Version::new(version))
            .payload(event)
            .unwrap()
            .build()
            .unwrap();
        envelope.position = Position::new(version);
        envelope
    }

    async fn view_with_schema(app_id: AppId, name: &str) -> (SchemasView, SchemaId) {
        let view = SchemasView::new();
        let command = CreateSchema::new(Actor::subject("me"), app_id, name)
            .field("title", StringFieldProperties::default());
        let events = Schema::default().create(&command).unwrap();
        view.handle(&envelope(command.schema_id, 1, &events[0]))
            .await
            .unwrap();
        (view, command.schema_id)
    }

    #[tokio::test]
    async fn test_schema_is_scoped_to_its_app() {
        let app_id = AppId::new();
        let (view, schema_id) = view_with_schema(app_id, "posts").await;

        assert!(view.get_schema(app_id, schema_id).await.is_some());
        assert!(view.get_schema(AppId::new(), schema_id).await.is_none());
        assert_eq!(
            view.find_by_name(app_id, "posts").await.map(|s| s.id),
            Some(schema_id)
        );
        assert_eq!(view.get_full_schema(schema_id).await.unwrap().fields().len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_schema_is_kept_but_not_found_by_name() {
        let app_id = AppId::new();
        let (view, schema_id) = view_with_schema(app_id, "posts").await;

        view.handle(&envelope(schema_id, 2, &SchemaEvent::SchemaDeleted))
            .await
            .unwrap();

        let schema = view.get_schema(app_id, schema_id).await.unwrap();
        assert!(schema.is_deleted);
        assert!(view.find_by_name(app_id, "posts").await.is_none());
        assert!(view.schemas_for_app(app_id).await.is_empty());
    }
}
