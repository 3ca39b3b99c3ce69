//! Content aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, AppId, ContentId, SchemaId};
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::error::DomainError;

use super::{
    ChangeContentStatus, ContentData, ContentEvent, CreateContent, PatchContent, Status,
    UpdateContent, guards,
};

/// A status change waiting for its due time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledStatus {
    pub status: Status,
    pub due_time: DateTime<Utc>,
}

/// Content aggregate root: one item of user data shaped by a schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Content {
    id: Option<ContentId>,
    app_id: Option<AppId>,
    schema_id: Option<SchemaId>,
    version: Version,
    data: ContentData,
    status: Status,
    scheduled: Option<ScheduledStatus>,
    is_deleted: bool,
}

impl Aggregate for Content {
    type Event = ContentEvent;

    fn aggregate_type() -> &'static str {
        "Content"
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

    fn apply(&mut self, event: ContentEvent) {
        match event {
            ContentEvent::ContentCreated {
                content_id,
                app_id,
                schema_id,
                data,
            } => {
                self.id = Some(content_id);
                self.app_id = Some(app_id);
                self.schema_id = Some(schema_id);
                self.data = data;
                self.status = Status::Draft;
            }
            ContentEvent::ContentUpdated { data } => {
                self.data = data;
            }
            ContentEvent::ContentStatusChanged { status } => {
                self.status = status;
                self.scheduled = None;
            }
            ContentEvent::ContentStatusScheduled { status, due_time } => {
                self.scheduled = Some(ScheduledStatus { status, due_time });
            }
            ContentEvent::ContentDeleted => {
                self.is_deleted = true;
            }
        }
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

// Query methods
impl Content {
    pub fn content_id(&self) -> Option<ContentId> {
        self.id
    }

    pub fn app_id(&self) -> Option<AppId> {
        self.app_id
    }

    pub fn schema_id(&self) -> Option<SchemaId> {
        self.schema_id
    }

    pub fn data(&self) -> &ContentData {
        &self.data
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn scheduled(&self) -> Option<&ScheduledStatus> {
        self.scheduled.as_ref()
    }
}

// Command methods (return events)
impl Content {
    pub fn create(&self, command: &CreateContent) -> Result<Vec<ContentEvent>, DomainError> {
        guards::can_create(command.data.as_ref())?;

        let mut events = vec![ContentEvent::ContentCreated {
            content_id: command.content_id,
            app_id: command.app_id,
            schema_id: command.schema_id,
            data: command.data.clone().unwrap_or_default(),
        }];

        if command.publish {
            events.push(ContentEvent::ContentStatusChanged {
                status: Status::Published,
            });
        }

        Ok(events)
    }

    pub fn update(&self, command: &UpdateContent) -> Result<Vec<ContentEvent>, DomainError> {
        guards::can_update(command.data.as_ref())?;

        Ok(self.data_changed(command.data.clone().unwrap_or_default()))
    }

    pub fn patch(&self, command: &PatchContent) -> Result<Vec<ContentEvent>, DomainError> {
        guards::can_patch(command.data.as_ref())?;

        let mut data = self.data.clone();
        if let Some(patch) = &command.data {
            for (field, value) in patch {
                data.insert(field.clone(), value.clone());
            }
        }

        Ok(self.data_changed(data))
    }

    pub fn change_status(
        &self,
        command: &ChangeContentStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentEvent>, DomainError> {
        guards::can_change_status(self.status, command, now)?;

        let event = match command.due_time {
            Some(due_time) => ContentEvent::ContentStatusScheduled {
                status: command.status,
                due_time,
            },
            None => ContentEvent::ContentStatusChanged {
                status: command.status,
            },
        };

        Ok(vec![event])
    }

    pub fn delete(&self) -> Result<Vec<ContentEvent>, DomainError> {
        Ok(vec![ContentEvent::ContentDeleted])
    }

    fn data_changed(&self, data: ContentData) -> Vec<ContentEvent> {
        if data == self.data {
            Vec::new()
        } else {
            vec![ContentEvent::ContentUpdated { data }]
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::command::Actor;

    fn data(value: serde_json::Value) -> ContentData {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn created(publish: bool) -> Content {
        let mut command = CreateContent::new(
            Actor::subject("me"),
            AppId::new(),
            SchemaId::new(),
            data(json!({ "title": { "iv": "Hello" } })),
        );
        command.publish = publish;
        Content::replay(Content::default().create(&command).unwrap())
    }

    #[test]
    fn test_create_starts_as_draft() {
        let content = created(false);
        assert_eq!(content.status(), Status::Draft);
        assert_eq!(content.version(), Version::first());
    }

    #[test]
    fn test_create_with_publish_stages_status_change() {
        let content = created(true);
        assert_eq!(content.status(), Status::Published);
        assert_eq!(content.version(), Version::new(2));
    }

    #[test]
    fn test_update_with_same_data_stages_nothing() {
        let content = created(false);
        let command = UpdateContent::new(
            Actor::subject("me"),
            content.content_id().unwrap(),
            content.data().clone(),
        );

        assert!(content.update(&command).unwrap().is_empty());
    }

    #[test]
    fn test_patch_merges_top_level_fields() {
        let content = created(false);
        let command = PatchContent::new(
            Actor::subject("me"),
            content.content_id().unwrap(),
            data(json!({ "body": { "iv": "World" } })),
        );

        let events = content.patch(&command).unwrap();
        assert_eq!(
            events,
            vec![ContentEvent::ContentUpdated {
                data: data(json!({
                    "title": { "iv": "Hello" },
                    "body": { "iv": "World" },
                })),
            }]
        );
    }

    #[test]
    fn test_scheduling_keeps_status_until_changed() {
        let mut content = created(false);
        let id = content.content_id().unwrap();
        let now = Utc::now();
        let due = now + Duration::hours(2);

        let schedule =
            ChangeContentStatus::new(Actor::subject("me"), id, Status::Published).due_at(due);
        content.apply_events(content.change_status(&schedule, now).unwrap());

        assert_eq!(content.status(), Status::Draft);
        assert_eq!(content.scheduled().unwrap().due_time, due);

        let publish = ChangeContentStatus::new(Actor::subject("me"), id, Status::Published);
        content.apply_events(content.change_status(&publish, now).unwrap());

        assert_eq!(content.status(), Status::Published);
        assert!(content.scheduled().is_none());
    }

    #[test]
    fn test_archived_content_must_be_restored_first() {
        let mut content = created(false);
        let id = content.content_id().unwrap();
        let now = Utc::now();

        let archive = ChangeContentStatus::new(Actor::subject("me"), id, Status::Archived);
        content.apply_events(content.change_status(&archive, now).unwrap());

        let publish = ChangeContentStatus::new(Actor::subject("me"), id, Status::Published);
        assert!(content.change_status(&publish, now).is_err());
    }
}
