//! Property tests for replaying event streams into aggregates.

use chrono::{TimeZone, Utc};
use common::{AppId, ContentId, SchemaId};
use domain::Aggregate;
use domain::app::{App, AppEvent, Language, Permission};
use domain::content::{Content, ContentData, ContentEvent, Status};
use event_store::Version;
use proptest::prelude::*;

fn status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Draft),
        Just(Status::Published),
        Just(Status::Archived),
    ]
}

fn data() -> impl Strategy<Value = ContentData> {
    prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..4).prop_map(|fields| {
        fields
            .into_iter()
            .map(|(name, value)| (name, serde_json::json!({ "iv": value })))
            .collect()
    })
}

fn content_event() -> impl Strategy<Value = ContentEvent> {
    prop_oneof![
        data().prop_map(|data| ContentEvent::ContentUpdated { data }),
        status().prop_map(|status| ContentEvent::ContentStatusChanged { status }),
        (status(), 0i64..4_000_000_000).prop_map(|(status, secs)| {
            ContentEvent::ContentStatusScheduled {
                status,
                due_time: Utc.timestamp_opt(secs, 0).single().unwrap_or_default(),
            }
        }),
        Just(ContentEvent::ContentDeleted),
    ]
}

fn content_stream() -> impl Strategy<Value = Vec<ContentEvent>> {
    (data(), prop::collection::vec(content_event(), 0..20)).prop_map(|(data, rest)| {
        let mut events = vec![ContentEvent::ContentCreated {
            content_id: ContentId::new(),
            app_id: AppId::new(),
            schema_id: SchemaId::new(),
            data,
        }];
        events.extend(rest);
        events
    })
}

fn language() -> impl Strategy<Value = Language> {
    prop_oneof![Just("de"), Just("fr"), Just("it"), Just("es")].prop_map(Language::new)
}

fn permission() -> impl Strategy<Value = Permission> {
    prop_oneof![
        Just(Permission::Owner),
        Just(Permission::Developer),
        Just(Permission::Editor),
    ]
}

fn app_event() -> impl Strategy<Value = AppEvent> {
    prop_oneof![
        ("[a-c]", permission()).prop_map(|(contributor_id, permission)| {
            AppEvent::AppContributorAssigned {
                contributor_id,
                permission,
            }
        }),
        "[a-c]".prop_map(|contributor_id| AppEvent::AppContributorRemoved { contributor_id }),
        language().prop_map(|language| AppEvent::AppLanguageAdded { language }),
        language().prop_map(|language| AppEvent::AppLanguageRemoved { language }),
        language().prop_map(|language| AppEvent::AppMasterLanguageSet { language }),
        "[x-z]".prop_map(|id| AppEvent::AppClientRevoked { id }),
    ]
}

fn app_stream() -> impl Strategy<Value = Vec<AppEvent>> {
    prop::collection::vec(app_event(), 0..20).prop_map(|rest| {
        let mut events = vec![AppEvent::AppCreated {
            app_id: AppId::new(),
            name: "acme".to_string(),
        }];
        events.extend(rest);
        events
    })
}

proptest! {
    #[test]
    fn test_content_replay_is_deterministic(events in content_stream()) {
        let first = Content::replay(events.clone());
        let second = Content::replay(events.clone());

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.version(), Version::new(events.len() as i64));
    }

    #[test]
    fn test_content_replay_can_resume_from_any_prefix(
        events in content_stream(),
        split in any::<prop::sample::Index>(),
    ) {
        let at = split.index(events.len() + 1);
        let mut resumed = Content::replay(events[..at].to_vec());
        for event in events[at..].iter().cloned() {
            resumed.apply(event);
            resumed.set_version(resumed.version().next());
        }

        prop_assert_eq!(resumed, Content::replay(events));
    }

    #[test]
    fn test_app_replay_is_deterministic(events in app_stream()) {
        let first = App::replay(events.clone());
        let second = App::replay(events.clone());

        prop_assert_eq!(&first, &second);
        prop_assert!(first.languages().contains(first.languages().master()));
    }
}
