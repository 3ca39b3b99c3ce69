//! Query surface shared by the draft and published content sets.

use std::collections::HashSet;

use async_trait::async_trait;
use common::{AppId, ContentId, SchemaId};
use domain::content::Status;

use crate::Result;

use super::{ContentEntity, ContentQuery, ResultList};

/// A set of content entities that answers content queries.
///
/// `statuses` restricts results to the given statuses; an empty slice means
/// any status. Deleted content is never returned.
#[async_trait]
pub trait ContentCollection: Send + Sync {
    fn name(&self) -> &'static str;

    /// Prepares the backing storage. Safe to call more than once.
    async fn initialize(&self) -> Result<()>;

    async fn query(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        statuses: &[Status],
        query: &ContentQuery,
    ) -> Result<ResultList<ContentEntity>>;

    async fn query_by_ids(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        statuses: &[Status],
        ids: &HashSet<ContentId>,
    ) -> Result<ResultList<ContentEntity>>;

    /// Finds content of any schema of an app by id.
    async fn query_app_by_ids(
        &self,
        app_id: AppId,
        statuses: &[Status],
        ids: &HashSet<ContentId>,
    ) -> Result<Vec<ContentEntity>>;

    async fn find_one(
        &self,
        app_id: AppId,
        schema_id: SchemaId,
        statuses: &[Status],
        id: ContentId,
    ) -> Result<Option<ContentEntity>>;

    async fn remove_app(&self, app_id: AppId) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

pub(crate) fn status_matches(entity: &ContentEntity, statuses: &[Status]) -> bool {
    statuses.is_empty() || statuses.contains(&entity.status)
}
