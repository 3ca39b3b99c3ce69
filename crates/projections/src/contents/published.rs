//! Published content set: the latest published version of each item.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{AppId, ContentId, SchemaId};
use domain::content::Status;
use tokio::sync::RwLock;

use crate::Result;
use crate::read_model::ReadModel;

use super::collection::ContentCollection;
use super::query;
use super::{ContentEntity, ContentQuery, ResultList};

/// Holds only content whose status is exactly `Published`.
///
/// Status filters are ignored: everything in this set is published.
#[derive(Clone, Default)]
pub struct PublishedContents {
    contents: Arc<RwLock<HashMap<ContentId, ContentEntity>>>,
    initialized: Arc<AtomicBool>,
}

impl PublishedContents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a published item, replacing an older copy.
    pub async fn upsert(&self, entity: ContentEntity) {
        debug_assert_eq!(entity.status, Status::Published);
        self.contents.write().await.insert(entity.id, entity);
    }

    pub async fn remove(&self, id: ContentId) {
        self.contents.write().await.remove(&id);
    }
}

#[async_trait]
impl ContentCollection for PublishedContents {
    fn name(&self) -> &'static str {
        "PublishedContents"
    }

    async fn initialize(&self) -> Result<()> {
        if !self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!(collection = "published", "content collection initialized");
        }
        Ok(())
    }

    async fn query(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        _statuses: &[Status],
        query: &ContentQuery,
    ) -> Result<ResultList<ContentEntity>> {
        let contents = self.contents.read().await;
        query::execute(
            contents
                .values()
                .filter(|e| e.app_id == app_id && e.schema_id == schema_id),
            query,
        )
    }

    async fn query_by_ids(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        _statuses: &[Status],
        ids: &HashSet<ContentId>,
    ) -> Result<ResultList<ContentEntity>> {
        let contents = self.contents.read().await;
        query::execute(
            ids.iter()
                .filter_map(|id| contents.get(id))
                .filter(|e| e.app_id == app_id && e.schema_id == schema_id),
            &ContentQuery::new(),
        )
    }

    async fn query_app_by_ids(
        &self,
        app_id: AppId,
        _statuses: &[Status],
        ids: &HashSet<ContentId>,
    ) -> Result<Vec<ContentEntity>> {
        let contents = self.contents.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| contents.get(id))
            .filter(|e| e.app_id == app_id)
            .cloned()
            .collect())
    }

    async fn find_one(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        _statuses: &[Status],
        id: ContentId,
    ) -> Result<Option<ContentEntity>> {
        Ok(self
            .contents
            .read()
            .await
            .get(&id)
            .filter(|e| e.app_id == app_id && e.schema_id == schema_id)
            .cloned())
    }

    async fn remove_app(&self, app_id: AppId) -> Result<()> {
        self.contents
            .write()
            .await
            .retain(|_, e| e.app_id != app_id);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.contents.write().await.clear();
        Ok(())
    }
}

impl ReadModel for PublishedContents {
    fn name(&self) -> &'static str {
        "PublishedContents"
    }

    fn count(&self) -> usize {
        self.contents.try_read().map(|c| c.len()).unwrap_or(0)
    }
}
