//! Content repository over the draft and published sets.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AppId, ContentId, SchemaId};
use domain::content::{Content, ContentEvent, Status};
use domain::{Aggregate, SchemaEntity, SchemaLookup};
use event_store::{EventEnvelope, Version};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};

use super::collection::ContentCollection;
use super::query::FilterNode;
use super::{ContentEntity, ContentQuery, DraftContents, PublishedContents, ResultList};

/// Answers content queries from the draft or published set and keeps both
/// up to date from content events.
///
/// Queries asking for exactly the `Published` status go to the published set.
/// Every other status filter, including none, goes to the draft set.
#[derive(Clone)]
pub struct ContentRepository {
    draft: DraftContents,
    published: PublishedContents,
    schemas: Arc<dyn SchemaLookup>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl ContentRepository {
    pub fn new(schemas: Arc<dyn SchemaLookup>) -> Self {
        Self {
            draft: DraftContents::new(),
            published: PublishedContents::new(),
            schemas,
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    pub fn draft(&self) -> &DraftContents {
        &self.draft
    }

    pub fn published(&self) -> &PublishedContents {
        &self.published
    }

    fn collection_for(&self, statuses: &[Status]) -> &dyn ContentCollection {
        let published_only =
            !statuses.is_empty() && statuses.iter().all(|s| *s == Status::Published);
        if published_only {
            &self.published
        } else {
            &self.draft
        }
    }

    /// Prepares both content sets.
    pub async fn initialize(&self) -> Result<()> {
        tokio::try_join!(self.draft.initialize(), self.published.initialize())?;
        Ok(())
    }

    #[tracing::instrument(skip(self, query))]
    pub async fn query(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        statuses: &[Status],
        query: &ContentQuery,
    ) -> Result<ResultList<ContentEntity>> {
        self.collection_for(statuses)
            .query(app_id, schema_id, statuses, query)
            .await
    }

    #[tracing::instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn query_by_ids(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        statuses: &[Status],
        ids: &HashSet<ContentId>,
    ) -> Result<ResultList<ContentEntity>> {
        self.collection_for(statuses)
            .query_by_ids(app_id, schema_id, statuses, ids)
            .await
    }

    /// Finds content of any schema of an app, paired with its schema.
    ///
    /// Items whose schema cannot be resolved are skipped.
    #[tracing::instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn query_across_schemas(
        &self,
        app_id: AppId,
        statuses: &[Status],
        ids: &HashSet<ContentId>,
    ) -> Result<Vec<(ContentEntity, SchemaEntity)>> {
        let mut contents = self
            .collection_for(statuses)
            .query_app_by_ids(app_id, statuses, ids)
            .await?;
        contents.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then(a.id.cmp(&b.id))
        });

        let mut result = Vec::with_capacity(contents.len());
        for content in contents {
            match self.schemas.get_schema(app_id, content.schema_id).await {
                Some(schema) => result.push((content, schema)),
                None => {
                    tracing::debug!(content_id = %content.id, schema_id = %content.schema_id, "schema not found, skipping content");
                }
            }
        }
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_one(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        statuses: &[Status],
        id: ContentId,
    ) -> Result<Option<ContentEntity>> {
        self.collection_for(statuses)
            .find_one(app_id, schema_id, statuses, id)
            .await
    }

    /// Returns the content as it was at `version`.
    pub async fn find_version(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        id: ContentId,
        version: Version,
    ) -> Option<ContentEntity> {
        self.draft
            .find_version(app_id, schema_id, id, version)
            .await
    }

    pub async fn query_ids(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        filter: Option<&FilterNode>,
    ) -> Result<Vec<ContentId>> {
        self.draft.query_ids(app_id, schema_id, filter).await
    }

    pub async fn query_ids_for_app(&self, app_id: AppId) -> Vec<ContentId> {
        self.draft.query_ids_for_app(app_id).await
    }

    /// Visits every content item with a status change due at `now`, without
    /// its data.
    ///
    /// Cancellation is checked before each item. Returns the number of items
    /// visited.
    #[tracing::instrument(skip(self, cancel, callback))]
    pub async fn query_scheduled_without_data<F, Fut>(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
        mut callback: F,
    ) -> Result<usize>
    where
        F: FnMut(ContentEntity) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut visited = 0;
        for (_, id) in self.draft.scheduled_due(now).await {
            if cancel.is_cancelled() {
                tracing::debug!(visited, "scheduled scan cancelled");
                break;
            }
            // An earlier callback may have changed or rescheduled the item.
            let Some(content) = self.draft.find_without_data(id).await else {
                continue;
            };
            if !content.is_due(now) {
                continue;
            }
            callback(content).await;
            visited += 1;
            metrics::counter!("contents_scheduled_visited").increment(1);
        }
        Ok(visited)
    }

    pub async fn remove_app(&self, app_id: AppId) -> Result<()> {
        tokio::try_join!(
            self.draft.remove_app(app_id),
            self.published.remove_app(app_id)
        )?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        tokio::try_join!(self.draft.clear(), self.published.clear())?;
        Ok(())
    }

    async fn apply(&self, envelope: &EventEnvelope, event: ContentEvent) -> Result<()> {
        let id = ContentId::from_uuid(envelope.stream_id.as_uuid());
        let actor = envelope.actor().unwrap_or_default().to_string();
        let current = self.draft.latest(id).await;

        if current
            .as_ref()
            .is_some_and(|c| envelope.version <= c.version)
        {
            return Ok(());
        }

        let mut content = match (current, event) {
            (
                None,
                ContentEvent::ContentCreated {
                    app_id,
                    schema_id,
                    data,
                    ..
                },
            ) => ContentEntity {
                id,
                app_id,
                schema_id,
                status: Status::Draft,
                version: envelope.version,
                data,
                created: envelope.timestamp,
                created_by: actor.clone(),
                last_modified: envelope.timestamp,
                last_modified_by: actor.clone(),
                scheduled_to: None,
                scheduled_at: None,
                scheduled_by: None,
                is_deleted: false,
            },
            (None, _) => {
                tracing::warn!(content_id = %id, event_type = %envelope.event_type, "content event without creation, ignoring");
                return Ok(());
            }
            (Some(mut content), event) => {
                match event {
                    ContentEvent::ContentCreated { .. } => {}
                    ContentEvent::ContentUpdated { data } => content.data = data,
                    ContentEvent::ContentStatusChanged { status } => {
                        content.status = status;
                        content.clear_schedule();
                    }
                    ContentEvent::ContentStatusScheduled { status, due_time } => {
                        content.scheduled_to = Some(status);
                        content.scheduled_at = Some(due_time);
                        content.scheduled_by = Some(actor.clone());
                    }
                    ContentEvent::ContentDeleted => content.is_deleted = true,
                }
                content
            }
        };

        content.version = envelope.version;
        content.last_modified = envelope.timestamp;
        content.last_modified_by = actor;

        if content.status == Status::Published && !content.is_deleted {
            self.published.upsert(content.clone()).await;
        } else {
            self.published.remove(id).await;
        }
        self.draft.upsert(content).await;
        Ok(())
    }
}

#[async_trait]
impl Projection for ContentRepository {
    fn name(&self) -> &'static str {
        "ContentRepository"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type == Content::aggregate_type() {
            let content_event: ContentEvent = serde_json::from_value(event.payload.clone())?;
            self.apply(event, content_event).await?;
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance(event.position);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.clear().await?;
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}
