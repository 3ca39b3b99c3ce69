//! Apps read model, also serving app lookups for command handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::AppId;
use domain::app::{App, AppEvent};
use domain::{Aggregate, AppEntity, AppLookup};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Read model of every app, folded from the app streams.
#[derive(Clone, Default)]
pub struct AppsView {
    apps: Arc<RwLock<HashMap<AppId, App>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl AppsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the full app state, including contributors and clients.
    pub async fn get_app(&self, app_id: AppId) -> Option<App> {
        self.apps.read().await.get(&app_id).cloned()
    }

    /// Returns the apps a user contributes to.
    pub async fn apps_for_contributor(&self, user_id: &str) -> Vec<AppEntity> {
        self.apps
            .read()
            .await
            .values()
            .filter(|app| app.contributors().contains_key(user_id))
            .filter_map(to_entity)
            .collect()
    }
}

fn to_entity(app: &App) -> Option<AppEntity> {
    Some(AppEntity {
        id: app.app_id()?,
        name: app.name().to_string(),
        version: app.version(),
        languages: app.languages().clone(),
    })
}

#[async_trait]
impl AppLookup for AppsView {
    async fn find_by_name(&self, name: &str) -> Option<AppEntity> {
        self.apps
            .read()
            .await
            .values()
            .find(|app| app.name() == name)
            .and_then(to_entity)
    }

    async fn find_by_id(&self, id: AppId) -> Option<AppEntity> {
        self.apps.read().await.get(&id).and_then(to_entity)
    }
}

#[async_trait]
impl Projection for AppsView {
    fn name(&self) -> &'static str {
        "AppsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type == App::aggregate_type() {
            let app_event: AppEvent = serde_json::from_value(event.payload.clone())?;
            let app_id = AppId::from_uuid(event.stream_id.as_uuid());

            let mut apps = self.apps.write().await;
            let app = apps.entry(app_id).or_default();
            if event.version > app.version() {
                app.apply(app_event);
                app.set_version(event.version);
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance(event.position);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.apps.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for AppsView {
    fn name(&self) -> &'static str {
        "AppsView"
    }

    fn count(&self) -> usize {
        // Returns 0 while a writer holds the lock.
        self.apps.try_read().map(|a| a.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use domain::Actor;
    use domain::app::{AddLanguage, CreateApp, Language};
    use event_store::{Position, Version};

    use super::*;

    fn envelope(app_id: AppId, version: i64, position: i64, event: &AppEvent) -> EventEnvelope {
        let mut envelope = EventEnvelope::builder()
            .stream_id(app_id)
            .aggregate_type("App")
            .event_type(domain::DomainEvent::event_type(event))
            .version(Version::new(version))
            .payload(event)
            .unwrap()
            .build()
            .unwrap();
        envelope.position = Position::new(position);
        envelope
    }

    async fn created_view() -> (AppsView, AppId) {
        let view = AppsView::new();
        let command = CreateApp::new(Actor::subject("me"), "acme");
        let events = App::default().create(&command).unwrap();
        for (i, event) in events.iter().enumerate() {
            let n = i as i64 + 1;
            view.handle(&envelope(command.app_id, n, n, event))
                .await
                .unwrap();
        }
        (view, command.app_id)
    }

    #[tokio::test]
    async fn test_finds_apps_by_name_and_id() {
        let (view, app_id) = created_view().await;

        let by_name = view.find_by_name("acme").await.unwrap();
        assert_eq!(by_name.id, app_id);
        assert_eq!(by_name.version, Version::new(2));
        assert_eq!(view.find_by_id(app_id).await, Some(by_name));
        assert!(view.find_by_name("other").await.is_none());
    }

    #[tokio::test]
    async fn test_replayed_events_are_ignored() {
        let (view, app_id) = created_view().await;
        let app = view.get_app(app_id).await.unwrap();
        let added = app
            .add_language(&AddLanguage::new(Actor::subject("me"), app_id, "de"))
            .unwrap();

        view.handle(&envelope(app_id, 3, 3, &added[0])).await.unwrap();
        view.handle(&envelope(app_id, 3, 3, &added[0])).await.unwrap();

        let entity = view.find_by_id(app_id).await.unwrap();
        assert_eq!(entity.version, Version::new(3));
        assert!(entity.languages.contains(&Language::new("de")));
        assert_eq!(view.position().await.events_processed, 4);
    }

    #[tokio::test]
    async fn test_creator_is_listed_as_contributor() {
        let (view, app_id) = created_view().await;

        let apps = view.apps_for_contributor("me").await;
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].id, app_id);
        assert!(view.apps_for_contributor("other").await.is_empty());
    }

    #[tokio::test]
    async fn test_read_model_reports_name_and_size() {
        let empty = AppsView::new();
        assert_eq!(ReadModel::name(&empty), "AppsView");
        assert!(empty.is_empty());

        let (view, _) = created_view().await;
        assert_eq!(view.count(), 1);
        assert!(!view.is_empty());

        view.reset().await.unwrap();
        assert!(view.is_empty());
    }
}
