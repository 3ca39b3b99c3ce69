//! Content domain events.

use chrono::{DateTime, Utc};
use common::{AppId, ContentId, SchemaId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{ContentData, Status};

/// Events that can occur on a content aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ContentEvent {
    /// Content was created as a draft.
    ContentCreated {
        content_id: ContentId,
        app_id: AppId,
        schema_id: SchemaId,
        data: ContentData,
    },

    /// Data was replaced. Carries the complete new data, also for patches.
    ContentUpdated { data: ContentData },

    /// Status changed; any pending schedule is cancelled.
    ContentStatusChanged { status: Status },

    /// A status change was scheduled for `due_time`.
    ContentStatusScheduled {
        status: Status,
        due_time: DateTime<Utc>,
    },

    ContentDeleted,
}

impl DomainEvent for ContentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ContentEvent::ContentCreated { .. } => "ContentCreated",
            ContentEvent::ContentUpdated { .. } => "ContentUpdated",
            ContentEvent::ContentStatusChanged { .. } => "ContentStatusChanged",
            ContentEvent::ContentStatusScheduled { .. } => "ContentStatusScheduled",
            ContentEvent::ContentDeleted => "ContentDeleted",
        }
    }
}
