//! Content commands.

use chrono::{DateTime, Utc};
use common::{AppId, ContentId, SchemaId};
use event_store::Version;

use crate::command::{Actor, impl_command};

use super::{Content, ContentData, Status};

/// Command to create a content item in a schema.
#[derive(Debug, Clone)]
pub struct CreateContent {
    pub content_id: ContentId,
    pub app_id: AppId,
    pub schema_id: SchemaId,
    pub data: Option<ContentData>,
    /// Publish immediately instead of starting as a draft.
    pub publish: bool,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl CreateContent {
    /// Creates the command with a generated content id.
    pub fn new(actor: Actor, app_id: AppId, schema_id: SchemaId, data: ContentData) -> Self {
        Self {
            content_id: ContentId::new(),
            app_id,
            schema_id,
            data: Some(data),
            publish: false,
            actor,
            expected_version: None,
        }
    }

    pub fn published(mut self) -> Self {
        self.publish = true;
        self
    }
}

/// Replaces the complete data of a content item.
#[derive(Debug, Clone)]
pub struct UpdateContent {
    pub content_id: ContentId,
    pub data: Option<ContentData>,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl UpdateContent {
    pub fn new(actor: Actor, content_id: ContentId, data: ContentData) -> Self {
        Self {
            content_id,
            data: Some(data),
            actor,
            expected_version: None,
        }
    }
}

/// Overwrites the given top-level fields and keeps all others.
#[derive(Debug, Clone)]
pub struct PatchContent {
    pub content_id: ContentId,
    pub data: Option<ContentData>,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl PatchContent {
    pub fn new(actor: Actor, content_id: ContentId, data: ContentData) -> Self {
        Self {
            content_id,
            data: Some(data),
            actor,
            expected_version: None,
        }
    }
}

/// Changes the status now, or at `due_time` when one is given.
#[derive(Debug, Clone)]
pub struct ChangeContentStatus {
    pub content_id: ContentId,
    pub status: Status,
    pub due_time: Option<DateTime<Utc>>,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl ChangeContentStatus {
    pub fn new(actor: Actor, content_id: ContentId, status: Status) -> Self {
        Self {
            content_id,
            status,
            due_time: None,
            actor,
            expected_version: None,
        }
    }

    pub fn due_at(mut self, due_time: DateTime<Utc>) -> Self {
        self.due_time = Some(due_time);
        self
    }
}

#[derive(Debug, Clone)]
pub struct DeleteContent {
    pub content_id: ContentId,
    pub actor: Actor,
    pub expected_version: Option<Version>,
}

impl DeleteContent {
    pub fn new(actor: Actor, content_id: ContentId) -> Self {
        Self {
            content_id,
            actor,
            expected_version: None,
        }
    }
}

impl_command!(Content =>
    CreateContent.content_id,
    UpdateContent.content_id,
    PatchContent.content_id,
    ChangeContentStatus.content_id,
    DeleteContent.content_id,
);

/// Every command handled by the content aggregate.
#[derive(Debug, Clone)]
pub enum ContentCommand {
    Create(CreateContent),
    Update(UpdateContent),
    Patch(PatchContent),
    ChangeStatus(ChangeContentStatus),
    Delete(DeleteContent),
}

impl ContentCommand {
    pub fn content_id(&self) -> ContentId {
        match self {
            ContentCommand::Create(c) => c.content_id,
            ContentCommand::Update(c) => c.content_id,
            ContentCommand::Patch(c) => c.content_id,
            ContentCommand::ChangeStatus(c) => c.content_id,
            ContentCommand::Delete(c) => c.content_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContentCommand::Create(_) => "CreateContent",
            ContentCommand::Update(_) => "UpdateContent",
            ContentCommand::Patch(_) => "PatchContent",
            ContentCommand::ChangeStatus(_) => "ChangeContentStatus",
            ContentCommand::Delete(_) => "DeleteContent",
        }
    }
}
