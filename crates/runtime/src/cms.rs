//! Composition root wiring the event store, command handlers and read models.

use std::sync::Arc;

use domain::{
    AggregateHandler, AppCommandHandler, CommandDispatcher, CommandHandler, CommandResult,
    ContentCommandHandler, DomainCommand, KeyGenerator, RandomKeyGenerator, SchemaCommandHandler,
};
use event_store::{EventStore, InMemoryEventStore, PostgresEventStore};
use projections::{AppsView, ContentRepository, ProjectionProcessor, ReadModel, SchemasView};

use crate::config::{Config, StoreConfig};
use crate::error::Result;
use crate::users::InMemoryUserDirectory;

/// The event store shared by every component.
pub type SharedStore = Arc<dyn EventStore>;

/// A fully wired CMS.
///
/// Commands are dispatched to the aggregate handlers. After each command the
/// projections catch up, so lookups and queries see the command's effects
/// once [`Cms::submit`] returns.
pub struct Cms {
    store: SharedStore,
    dispatcher: CommandDispatcher,
    processor: ProjectionProcessor<SharedStore>,
    apps: AppsView,
    schemas: SchemasView,
    contents: ContentRepository,
    users: InMemoryUserDirectory,
}

impl Cms {
    /// Wires a CMS over `store` with the default key generator.
    pub fn new(store: SharedStore, users: InMemoryUserDirectory, command_retries: usize) -> Self {
        Self::with_keys(store, users, command_retries, Arc::new(RandomKeyGenerator))
    }

    pub fn with_keys(
        store: SharedStore,
        users: InMemoryUserDirectory,
        command_retries: usize,
        keys: Arc<dyn KeyGenerator>,
    ) -> Self {
        let apps = AppsView::new();
        let schemas = SchemasView::new();
        let contents = ContentRepository::new(Arc::new(schemas.clone()));

        let mut processor = ProjectionProcessor::new(store.clone());
        processor.register(Arc::new(apps.clone()));
        processor.register(Arc::new(schemas.clone()));
        processor.register(Arc::new(contents.clone()));

        let handler = AggregateHandler::new(store.clone()).with_max_retries(command_retries);
        let handlers: Vec<Arc<dyn CommandHandler>> = vec![
            Arc::new(AppCommandHandler::new(
                handler.clone(),
                Arc::new(apps.clone()),
                Arc::new(users.clone()),
                keys,
            )),
            Arc::new(SchemaCommandHandler::new(
                handler.clone(),
                Arc::new(apps.clone()),
                Arc::new(schemas.clone()),
            )),
            Arc::new(ContentCommandHandler::new(
                handler,
                Arc::new(schemas.clone()),
            )),
        ];

        Self {
            store,
            dispatcher: CommandDispatcher::new(handlers),
            processor,
            apps,
            schemas,
            contents,
            users,
        }
    }

    /// Builds the store and user directory described by `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store: SharedStore = match &config.store {
            StoreConfig::Memory => Arc::new(InMemoryEventStore::new()),
            StoreConfig::Postgres { database_url } => {
                Arc::new(PostgresEventStore::connect(database_url).await?)
            }
        };
        let users = InMemoryUserDirectory::from_entries(config.users.iter().cloned());

        Ok(Self::new(store, users, config.command_retries))
    }

    /// Prepares storage and brings every read model up to date.
    ///
    /// Safe to call more than once.
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        self.store.initialize().await?;
        self.contents.initialize().await?;
        let events = self.processor.run_catch_up().await?;
        tracing::info!(
            events,
            projections = self.processor.projection_count(),
            apps = self.apps.count(),
            schemas = self.schemas.count(),
            users = self.users.len(),
            "cms initialized"
        );
        Ok(())
    }

    /// Executes a command and updates the read models.
    pub async fn submit(&self, command: impl Into<DomainCommand>) -> Result<CommandResult> {
        let result = self.dispatcher.submit(command.into()).await?;
        if result.succeeded {
            self.processor.run_catch_up().await?;
        }
        Ok(result)
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn apps(&self) -> &AppsView {
        &self.apps
    }

    pub fn schemas(&self) -> &SchemasView {
        &self.schemas
    }

    pub fn contents(&self) -> &ContentRepository {
        &self.contents
    }

    pub fn users(&self) -> &InMemoryUserDirectory {
        &self.users
    }
}
