//! Integration tests: the wired CMS and the scheduled publishing worker.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{AppId, ContentId, SchemaId};
use domain::app::{AppCommand, AssignContributor, CreateApp, Permission};
use domain::content::{ChangeContentStatus, ContentCommand, ContentData, CreateContent, Status};
use domain::schema::{CreateSchema, SchemaCommand, StringFieldProperties};
use domain::{Actor, AppLookup, SchemaLookup};
use event_store::InMemoryEventStore;
use projections::ContentQuery;
use runtime::{Cms, ContentScheduler, InMemoryUserDirectory, SharedStore};
use tokio_util::sync::CancellationToken;

fn alice() -> Actor {
    Actor::subject("alice")
}

fn cms_over(store: SharedStore) -> Cms {
    let users = InMemoryUserDirectory::from_entries([("alice", "Alice"), ("bob", "Bob")]);
    Cms::new(store, users, 3)
}

async fn setup(cms: &Cms) -> (AppId, SchemaId) {
    let create_app = CreateApp::new(alice(), "acme");
    let app_id = create_app.app_id;
    assert!(cms.submit(AppCommand::Create(create_app)).await.unwrap().succeeded);

    let create_schema =
        CreateSchema::new(alice(), app_id, "posts").field("title", StringFieldProperties::default());
    let schema_id = create_schema.schema_id;
    assert!(cms.submit(SchemaCommand::Create(create_schema)).await.unwrap().succeeded);

    (app_id, schema_id)
}

async fn create_content(cms: &Cms, app_id: AppId, schema_id: SchemaId) -> ContentId {
    let mut data = ContentData::new();
    data.insert("title".to_string(), serde_json::json!({ "iv": "hello" }));
    let command = CreateContent::new(alice(), app_id, schema_id, data);
    let content_id = command.content_id;
    assert!(cms.submit(ContentCommand::Create(command)).await.unwrap().succeeded);
    content_id
}

#[tokio::test]
async fn test_initialize_is_repeatable() {
    let cms = cms_over(Arc::new(InMemoryEventStore::new()));
    cms.initialize().await.unwrap();
    cms.initialize().await.unwrap();
}

#[tokio::test]
async fn test_submit_updates_lookups() {
    let cms = cms_over(Arc::new(InMemoryEventStore::new()));
    cms.initialize().await.unwrap();
    let (app_id, schema_id) = setup(&cms).await;

    assert_eq!(cms.apps().find_by_name("acme").await.map(|a| a.id), Some(app_id));
    assert_eq!(
        cms.schemas().find_by_name(app_id, "posts").await.map(|s| s.id),
        Some(schema_id)
    );
}

#[tokio::test]
async fn test_contributors_must_exist_in_user_directory() {
    let cms = cms_over(Arc::new(InMemoryEventStore::new()));
    let (app_id, _) = setup(&cms).await;

    let known = cms
        .submit(AppCommand::AssignContributor(AssignContributor::new(
            alice(),
            app_id,
            "bob",
            Permission::Editor,
        )))
        .await
        .unwrap();
    assert!(known.succeeded);

    let unknown = cms
        .submit(AppCommand::AssignContributor(AssignContributor::new(
            alice(),
            app_id,
            "mallory",
            Permission::Editor,
        )))
        .await
        .unwrap();
    assert!(!unknown.succeeded);
}

#[tokio::test]
async fn test_read_models_are_rebuilt_over_an_existing_store() {
    let store: SharedStore = Arc::new(InMemoryEventStore::new());
    let first = cms_over(store.clone());
    let (app_id, schema_id) = setup(&first).await;
    let content_id = create_content(&first, app_id, schema_id).await;

    let second = cms_over(store);
    assert!(second.apps().find_by_id(app_id).await.is_none());
    second.initialize().await.unwrap();

    assert!(second.apps().find_by_id(app_id).await.is_some());
    let found = second
        .contents()
        .find_one(app_id, schema_id, &[], content_id)
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn test_scheduler_applies_due_status_changes() {
    let cms = Arc::new(cms_over(Arc::new(InMemoryEventStore::new())));
    let (app_id, schema_id) = setup(&cms).await;
    let content_id = create_content(&cms, app_id, schema_id).await;

    let due = Utc::now() + chrono::Duration::minutes(5);
    let scheduled = cms
        .submit(ContentCommand::ChangeStatus(
            ChangeContentStatus::new(alice(), content_id, Status::Published).due_at(due),
        ))
        .await
        .unwrap();
    assert!(scheduled.succeeded);

    let scheduler = ContentScheduler::new(cms.clone(), Duration::from_secs(60));
    let cancel = CancellationToken::new();

    assert_eq!(scheduler.sweep(Utc::now(), &cancel).await.unwrap(), 0);
    assert_eq!(
        scheduler
            .sweep(due + chrono::Duration::seconds(1), &cancel)
            .await
            .unwrap(),
        1
    );

    let published = cms
        .contents()
        .query(app_id, schema_id, &[Status::Published], &ContentQuery::new())
        .await
        .unwrap();
    assert_eq!(published.len(), 1);
    let content = &published.items[0];
    assert_eq!(content.id, content_id);
    assert!(!content.is_scheduled());
    assert_eq!(content.last_modified_by, "subject:alice");

    assert_eq!(
        scheduler
            .sweep(due + chrono::Duration::seconds(1), &cancel)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_scheduler_stops_on_cancellation() {
    let cms = Arc::new(cms_over(Arc::new(InMemoryEventStore::new())));
    let scheduler = ContentScheduler::new(cms, Duration::from_millis(10));
    let cancel = CancellationToken::new();

    let worker = tokio::spawn({
        let cancel = cancel.clone();
        async move { scheduler.run(cancel).await }
    });
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("scheduler did not stop")
        .unwrap();
}
