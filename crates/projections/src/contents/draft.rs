//! Draft content set: every version of every content item.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AppId, ContentId, SchemaId};
use domain::content::Status;
use event_store::Version;
use tokio::sync::RwLock;

use crate::Result;
use crate::read_model::ReadModel;

use super::collection::{ContentCollection, status_matches};
use super::query::{self, FilterNode};
use super::{ContentEntity, ContentQuery, ResultList};

type History = BTreeMap<Version, ContentEntity>;

/// Holds the full version history of each content item, in any status.
///
/// Queries see the latest version of each item that is not deleted.
#[derive(Clone, Default)]
pub struct DraftContents {
    contents: Arc<RwLock<HashMap<ContentId, History>>>,
    initialized: Arc<AtomicBool>,
}

impl DraftContents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest version of an item, deleted or not.
    pub async fn latest(&self, id: ContentId) -> Option<ContentEntity> {
        self.contents
            .read()
            .await
            .get(&id)
            .and_then(|history| history.values().next_back().cloned())
    }

    /// Records a new version of an item.
    pub async fn upsert(&self, entity: ContentEntity) {
        self.contents
            .write()
            .await
            .entry(entity.id)
            .or_default()
            .insert(entity.version, entity);
    }

    /// Returns the item as it was at `version`.
    pub async fn find_version(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        id: ContentId,
        version: Version,
    ) -> Option<ContentEntity> {
        self.contents
            .read()
            .await
            .get(&id)
            .and_then(|history| history.range(..=version).next_back())
            .map(|(_, entity)| entity)
            .filter(|e| e.app_id == app_id && e.schema_id == schema_id)
            .cloned()
    }

    /// Returns the ids of live items of a schema that match `filter`.
    pub async fn query_ids(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        filter: Option<&FilterNode>,
    ) -> Result<Vec<ContentId>> {
        let contents = self.contents.read().await;
        let mut ids = Vec::new();
        for entity in live(&contents) {
            if entity.app_id != app_id || entity.schema_id != schema_id {
                continue;
            }
            if let Some(filter) = filter
                && !query::matches(entity, filter)?
            {
                continue;
            }
            ids.push(entity.id);
        }
        ids.sort();
        Ok(ids)
    }

    pub async fn query_ids_for_app(&self, app_id: AppId) -> Vec<ContentId> {
        let contents = self.contents.read().await;
        let mut ids: Vec<_> = live(&contents)
            .filter(|e| e.app_id == app_id)
            .map(|e| e.id)
            .collect();
        ids.sort();
        ids
    }

    /// Returns the schedule time and id of live items with a status change
    /// due at `now`, oldest due first.
    pub async fn scheduled_due(&self, now: DateTime<Utc>) -> Vec<(DateTime<Utc>, ContentId)> {
        let contents = self.contents.read().await;
        let mut due: Vec<_> = live(&contents)
            .filter_map(|e| e.scheduled_at.filter(|at| *at <= now).map(|at| (at, e.id)))
            .collect();
        due.sort();
        due
    }

    /// Returns the latest version of a live item with its data left empty.
    pub async fn find_without_data(&self, id: ContentId) -> Option<ContentEntity> {
        self.contents
            .read()
            .await
            .get(&id)
            .and_then(|history| history.values().next_back())
            .filter(|e| !e.is_deleted)
            .map(ContentEntity::without_data)
    }
}

fn live(contents: &HashMap<ContentId, History>) -> impl Iterator<Item = &ContentEntity> {
    contents
        .values()
        .filter_map(|history| history.values().next_back())
        .filter(|e| !e.is_deleted)
}

#[async_trait]
impl ContentCollection for DraftContents {
    fn name(&self) -> &'static str {
        "DraftContents"
    }

    async fn initialize(&self) -> Result<()> {
        if !self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!(collection = "draft", "content collection initialized");
        }
        Ok(())
    }

    async fn query(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        statuses: &[Status],
        query: &ContentQuery,
    ) -> Result<ResultList<ContentEntity>> {
        let contents = self.contents.read().await;
        query::execute(
            live(&contents).filter(|e| {
                e.app_id == app_id && e.schema_id == schema_id && status_matches(e, statuses)
            }),
            query,
        )
    }

    async fn query_by_ids(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        statuses: &[Status],
        ids: &HashSet<ContentId>,
    ) -> Result<ResultList<ContentEntity>> {
        let contents = self.contents.read().await;
        query::execute(
            live(&contents).filter(|e| {
                e.app_id == app_id
                    && e.schema_id == schema_id
                    && ids.contains(&e.id)
                    && status_matches(e, statuses)
            }),
            &ContentQuery::new(),
        )
    }

    async fn query_app_by_ids(
        &self,
        app_id: AppId,
        statuses: &[Status],
        ids: &HashSet<ContentId>,
    ) -> Result<Vec<ContentEntity>> {
        let contents = self.contents.read().await;
        Ok(live(&contents)
            .filter(|e| e.app_id == app_id && ids.contains(&e.id) && status_matches(e, statuses))
            .cloned()
            .collect())
    }

    async fn find_one(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        statuses: &[Status],
        id: ContentId,
    ) -> Result<Option<ContentEntity>> {
        Ok(self.latest(id).await.filter(|e| {
            !e.is_deleted
                && e.app_id == app_id
                && e.schema_id == schema_id
                && status_matches(e, statuses)
        }))
    }

    async fn remove_app(&self, app_id: AppId) -> Result<()> {
        self.contents
            .write()
            .await
            .retain(|_, history| history.values().all(|e| e.app_id != app_id));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.contents.write().await.clear();
        Ok(())
    }
}

impl ReadModel for DraftContents {
    fn name(&self) -> &'static str {
        "DraftContents"
    }

    fn count(&self) -> usize {
        self.contents.try_read().map(|c| c.len()).unwrap_or(0)
    }
}
