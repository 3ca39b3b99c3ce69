//! Content read model entity.

use chrono::{DateTime, Utc};
use common::{AppId, ContentId, SchemaId};
use domain::content::{ContentData, Status};
use event_store::Version;
use serde::{Deserialize, Serialize};

/// A content item as seen by queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntity {
    pub id: ContentId,
    pub app_id: AppId,
    pub schema_id: SchemaId,
    pub status: Status,
    pub version: Version,
    pub data: ContentData,
    pub created: DateTime<Utc>,
    pub created_by: String,
    pub last_modified: DateTime<Utc>,
    pub last_modified_by: String,
    pub scheduled_to: Option<Status>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub scheduled_by: Option<String>,
    pub is_deleted: bool,
}

impl ContentEntity {
    /// Returns a copy with empty data, for callers that only need metadata.
    pub fn without_data(&self) -> Self {
        Self {
            id: self.id,
            app_id: self.app_id,
            schema_id: self.schema_id,
            status: self.status,
            version: self.version,
            data: ContentData::new(),
            created: self.created,
            created_by: self.created_by.clone(),
            last_modified: self.last_modified,
            last_modified_by: self.last_modified_by.clone(),
            scheduled_to: self.scheduled_to,
            scheduled_at: self.scheduled_at,
            scheduled_by: self.scheduled_by.clone(),
            is_deleted: self.is_deleted,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_at.is_some()
    }

    /// Returns true when a scheduled status change is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at.is_some_and(|at| at <= now)
    }

    pub(crate) fn clear_schedule(&mut self) {
        self.scheduled_to = None;
        self.scheduled_at = None;
        self.scheduled_by = None;
    }
}
