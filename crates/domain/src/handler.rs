//! Load, mutate and append cycle for aggregates.

use common::AggregateId;
use event_store::{EventEnvelope, EventStore, EventStoreError, EventStoreExt, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::command::Command;
use crate::error::DomainError;

/// Conflict retries performed by [`AggregateHandler::update`] unless configured.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Result of a successful command execution.
#[derive(Debug)]
pub struct AggregateResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were appended.
    pub events: Vec<A::Event>,

    /// The version of the aggregate after the command.
    pub new_version: Version,
}

/// Runs commands against aggregates stored in an event store.
///
/// The handler is responsible for:
/// 1. Loading the aggregate by replaying its stream
/// 2. Running the mutator, which validates and stages events
/// 3. Appending the staged events at the loaded version
/// 4. Re-running the whole cycle when another writer got there first
#[derive(Clone)]
pub struct AggregateHandler<S> {
    store: S,
    max_retries: usize,
}

impl<S: EventStore> AggregateHandler<S> {
    /// Creates a new handler with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets how many times a conflicting update is re-run before giving up.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replays a stream into an aggregate.
    ///
    /// A stream without events yields the default aggregate.
    pub async fn load<A: Aggregate>(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        let events = self.store.read_all(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in events {
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning `None` if it was never created or is deleted.
    pub async fn load_existing<A: Aggregate>(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Option<A>, DomainError> {
        let aggregate: A = self.load(aggregate_id).await?;
        if aggregate.id().is_some() && !aggregate.is_deleted() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Runs a create mutator on a fresh aggregate and appends at version 0.
    #[tracing::instrument(
        skip_all,
        fields(
            aggregate_type = C::Aggregate::aggregate_type(),
            aggregate_id = %command.aggregate_id(),
        )
    )]
    pub async fn create<C, F>(
        &self,
        command: &C,
        mutator: F,
    ) -> Result<AggregateResult<C::Aggregate>, DomainError>
    where
        C: Command,
        F: FnOnce(&C::Aggregate) -> Result<Vec<<C::Aggregate as Aggregate>::Event>, DomainError>
            + Send,
    {
        let aggregate = C::Aggregate::default();
        let events = mutator(&aggregate)?;

        match self.commit(command, aggregate, events).await {
            Err(DomainError::EventStore(EventStoreError::Conflict { stream_id, .. })) => {
                Err(DomainError::AlreadyExists {
                    kind: C::Aggregate::aggregate_type(),
                    id: stream_id.to_string(),
                })
            }
            result => result,
        }
    }

    /// Loads the aggregate, runs the mutator and appends at the loaded version.
    ///
    /// On a conflict the cycle is re-run against fresh state up to the
    /// configured number of retries. Commands that pin an expected version
    /// are checked against the loaded version and never retried.
    #[tracing::instrument(
        skip_all,
        fields(
            aggregate_type = C::Aggregate::aggregate_type(),
            aggregate_id = %command.aggregate_id(),
        )
    )]
    pub async fn update<C, F>(
        &self,
        command: &C,
        mutator: F,
    ) -> Result<AggregateResult<C::Aggregate>, DomainError>
    where
        C: Command,
        F: Fn(&C::Aggregate) -> Result<Vec<<C::Aggregate as Aggregate>::Event>, DomainError>
            + Send
            + Sync,
    {
        let aggregate_id = command.aggregate_id();
        let mut retries = 0;

        loop {
            let aggregate: C::Aggregate = self.load(aggregate_id).await?;
            if aggregate.id().is_none() || aggregate.is_deleted() {
                return Err(DomainError::not_found(
                    C::Aggregate::aggregate_type(),
                    aggregate_id,
                ));
            }

            if let Some(expected) = command.expected_version()
                && expected != aggregate.version()
            {
                return Err(EventStoreError::Conflict {
                    stream_id: aggregate_id,
                    expected,
                    actual: aggregate.version(),
                }
                .into());
            }

            let events = mutator(&aggregate)?;

            match self.commit(command, aggregate, events).await {
                Err(e)
                    if e.is_conflict()
                        && command.expected_version().is_none()
                        && retries < self.max_retries =>
                {
                    retries += 1;
                    metrics::counter!("aggregate_conflict_retries").increment(1);
                    tracing::warn!(retries, "conflict on append, reloading");
                }
                result => return result,
            }
        }
    }

    async fn commit<C: Command>(
        &self,
        command: &C,
        mut aggregate: C::Aggregate,
        events: Vec<<C::Aggregate as Aggregate>::Event>,
    ) -> Result<AggregateResult<C::Aggregate>, DomainError> {
        let current_version = aggregate.version();

        if events.is_empty() {
            return Ok(AggregateResult {
                aggregate,
                events,
                new_version: current_version,
            });
        }

        let envelopes = build_envelopes::<C>(command, current_version, &events)?;
        let new_version = self
            .store
            .append(command.aggregate_id(), current_version, envelopes)
            .await?;

        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        tracing::debug!(%new_version, count = events.len(), "command committed");

        Ok(AggregateResult {
            aggregate,
            events,
            new_version,
        })
    }
}

fn build_envelopes<C: Command>(
    command: &C,
    current_version: Version,
    events: &[<C::Aggregate as Aggregate>::Event],
) -> Result<Vec<EventEnvelope>, DomainError> {
    let mut envelopes = Vec::with_capacity(events.len());
    let mut version = current_version;

    for event in events {
        version = version.next();
        let envelope = EventEnvelope::builder()
            .stream_id(command.aggregate_id())
            .aggregate_type(C::Aggregate::aggregate_type())
            .event_type(event.event_type())
            .version(version)
            .actor(command.actor().to_string())
            .payload(event)?
            .build()?;
        envelopes.push(envelope);
    }

    Ok(envelopes)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use event_store::{EventStream, InMemoryEventStore, Position};
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::command::Actor;
    use crate::validation::Validator;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type", content = "data")]
    enum CounterEvent {
        Created { id: AggregateId },
        Incremented { by: i64 },
        Deleted,
    }

    impl DomainEvent for CounterEvent {
        fn event_type(&self) -> &'static str {
            match self {
                CounterEvent::Created { .. } => "CounterCreated",
                CounterEvent::Incremented { .. } => "CounterIncremented",
                CounterEvent::Deleted => "CounterDeleted",
            }
        }
    }

    #[derive(Debug, Default, Clone)]
    struct Counter {
        id: Option<AggregateId>,
        value: i64,
        deleted: bool,
        version: Version,
    }

    impl Aggregate for Counter {
        type Event = CounterEvent;

        fn aggregate_type() -> &'static str {
            "Counter"
        }

        fn id(&self) -> Option<AggregateId> {
            self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: CounterEvent) {
            match event {
                CounterEvent::Created { id } => self.id = Some(id),
                CounterEvent::Incremented { by } => self.value += by,
                CounterEvent::Deleted => self.deleted = true,
            }
        }

        fn is_deleted(&self) -> bool {
            self.deleted
        }
    }

    impl Counter {
        fn increment(&self, by: i64) -> Result<Vec<CounterEvent>, DomainError> {
            let mut validator = Validator::new();
            if by <= 0 {
                validator.error("Increment must be positive.", ["By"]);
            }
            if self.value + by > 100 {
                validator.error("Counter cannot exceed 100.", ["By"]);
            }
            validator.finish("Cannot increment counter.")?;
            Ok(vec![CounterEvent::Incremented { by }])
        }
    }

    struct CounterCommand {
        id: AggregateId,
        actor: Actor,
        expected_version: Option<Version>,
    }

    impl CounterCommand {
        fn new(id: AggregateId) -> Self {
            Self {
                id,
                actor: Actor::subject("tester"),
                expected_version: None,
            }
        }
    }

    impl Command for CounterCommand {
        type Aggregate = Counter;

        fn aggregate_id(&self) -> AggregateId {
            self.id
        }

        fn actor(&self) -> &Actor {
            &self.actor
        }

        fn expected_version(&self) -> Option<Version> {
            self.expected_version
        }
    }

    /// Store that lets a competing writer append right before each of the
    /// first `races` appends it receives.
    #[derive(Clone)]
    struct RacingStore {
        inner: InMemoryEventStore,
        races: Arc<AtomicUsize>,
    }

    impl RacingStore {
        fn new(races: usize) -> Self {
            Self {
                inner: InMemoryEventStore::new(),
                races: Arc::new(AtomicUsize::new(races)),
            }
        }
    }

    #[async_trait]
    impl EventStore for RacingStore {
        async fn initialize(&self) -> event_store::Result<()> {
            Ok(())
        }

        async fn append(
            &self,
            stream_id: AggregateId,
            expected_version: Version,
            events: Vec<EventEnvelope>,
        ) -> event_store::Result<Version> {
            let race = self
                .races
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if race {
                let competing = EventEnvelope::builder()
                    .stream_id(stream_id)
                    .aggregate_type("Counter")
                    .event_type("CounterIncremented")
                    .version(expected_version.next())
                    .payload(&CounterEvent::Incremented { by: 10 })?
                    .build()?;
                self.inner
                    .append(stream_id, expected_version, vec![competing])
                    .await?;
            }
            self.inner.append(stream_id, expected_version, events).await
        }

        async fn read_stream(
            &self,
            stream_id: AggregateId,
            from_version: Version,
        ) -> event_store::Result<Vec<EventEnvelope>> {
            self.inner.read_stream(stream_id, from_version).await
        }

        async fn stream_version(&self, stream_id: AggregateId) -> event_store::Result<Option<Version>> {
            self.inner.stream_version(stream_id).await
        }

        async fn stream_all_from(&self, after: Position) -> event_store::Result<EventStream> {
            self.inner.stream_all_from(after).await
        }
    }

    async fn create_counter<S: EventStore>(handler: &AggregateHandler<S>) -> AggregateId {
        let id = AggregateId::new();
        handler
            .create(&CounterCommand::new(id), |_| Ok(vec![CounterEvent::Created { id }]))
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_create_appends_at_initial_version() {
        let handler = AggregateHandler::new(InMemoryEventStore::new());
        let id = AggregateId::new();

        let result = handler
            .create(&CounterCommand::new(id), |_| Ok(vec![CounterEvent::Created { id }]))
            .await
            .unwrap();

        assert_eq!(result.new_version, Version::first());
        assert_eq!(result.aggregate.id(), Some(id));

        let events = handler.store().read_all(id).await.unwrap();
        assert_eq!(events[0].actor(), Some("subject:tester"));
        assert_eq!(events[0].aggregate_type, "Counter");
    }

    #[tokio::test]
    async fn test_create_twice_is_already_exists() {
        let handler = AggregateHandler::new(InMemoryEventStore::new());
        let id = create_counter(&handler).await;

        let result = handler
            .create(&CounterCommand::new(id), |_| Ok(vec![CounterEvent::Created { id }]))
            .await;

        assert!(matches!(result, Err(DomainError::AlreadyExists { kind: "Counter", .. })));
    }

    #[tokio::test]
    async fn test_update_replays_and_appends() {
        let handler = AggregateHandler::new(InMemoryEventStore::new());
        let id = create_counter(&handler).await;

        handler
            .update(&CounterCommand::new(id), |c: &Counter| c.increment(5))
            .await
            .unwrap();
        let result = handler
            .update(&CounterCommand::new(id), |c: &Counter| c.increment(7))
            .await
            .unwrap();

        assert_eq!(result.new_version, Version::new(3));
        assert_eq!(result.aggregate.value, 12);

        let loaded: Counter = handler.load(id).await.unwrap();
        assert_eq!(loaded.value, 12);
        assert_eq!(loaded.version(), Version::new(3));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let handler = AggregateHandler::new(InMemoryEventStore::new());

        let result = handler
            .update(&CounterCommand::new(AggregateId::new()), |c: &Counter| c.increment(1))
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { kind: "Counter", .. })));
    }

    #[tokio::test]
    async fn test_update_deleted_is_not_found() {
        let handler = AggregateHandler::new(InMemoryEventStore::new());
        let id = create_counter(&handler).await;
        handler
            .update(&CounterCommand::new(id), |_: &Counter| Ok(vec![CounterEvent::Deleted]))
            .await
            .unwrap();

        let result = handler
            .update(&CounterCommand::new(id), |c: &Counter| c.increment(1))
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert!(handler.load_existing::<Counter>(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_validation_failure_appends_nothing() {
        let handler = AggregateHandler::new(InMemoryEventStore::new());
        let id = create_counter(&handler).await;

        let result = handler
            .update(&CounterCommand::new(id), |c: &Counter| c.increment(-500))
            .await;

        match result {
            Err(DomainError::Validation { errors, .. }) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(handler.store().event_count().await, 1);
    }

    #[tokio::test]
    async fn test_empty_events_returns_without_persisting() {
        let handler = AggregateHandler::new(InMemoryEventStore::new());
        let id = create_counter(&handler).await;

        let result = handler
            .update(&CounterCommand::new(id), |_: &Counter| Ok(vec![]))
            .await
            .unwrap();

        assert!(result.events.is_empty());
        assert_eq!(result.new_version, Version::first());
        assert_eq!(handler.store().event_count().await, 1);
    }

    #[tokio::test]
    async fn test_conflict_is_retried_against_fresh_state() {
        let store = RacingStore::new(0);
        let handler = AggregateHandler::new(store.clone());
        let id = create_counter(&handler).await;
        store.races.store(2, Ordering::SeqCst);

        let runs = AtomicUsize::new(0);
        let result = handler
            .update(&CounterCommand::new(id), |c: &Counter| {
                runs.fetch_add(1, Ordering::SeqCst);
                c.increment(1)
            })
            .await
            .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 3);
        // Two competing increments of 10 landed before ours.
        assert_eq!(result.aggregate.value, 21);
        assert_eq!(result.new_version, Version::new(4));
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let store = RacingStore::new(0);
        let handler = AggregateHandler::new(store.clone()).with_max_retries(1);
        let id = create_counter(&handler).await;
        store.races.store(5, Ordering::SeqCst);

        let result = handler
            .update(&CounterCommand::new(id), |c: &Counter| c.increment(1))
            .await;

        assert!(result.as_ref().is_err_and(DomainError::is_conflict));
    }

    #[tokio::test]
    async fn test_retry_reruns_guards() {
        let store = RacingStore::new(0);
        let handler = AggregateHandler::new(store.clone());
        let id = create_counter(&handler).await;
        handler
            .update(&CounterCommand::new(id), |c: &Counter| c.increment(85))
            .await
            .unwrap();
        store.races.store(1, Ordering::SeqCst);

        // 85 + 10 from the competing writer leaves no room for 10 more.
        let result = handler
            .update(&CounterCommand::new(id), |c: &Counter| c.increment(10))
            .await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_pinned_expected_version_is_not_retried() {
        let handler = AggregateHandler::new(InMemoryEventStore::new());
        let id = create_counter(&handler).await;
        handler
            .update(&CounterCommand::new(id), |c: &Counter| c.increment(1))
            .await
            .unwrap();

        let mut stale = CounterCommand::new(id);
        stale.expected_version = Some(Version::first());
        let result = handler
            .update(&stale, |c: &Counter| c.increment(1))
            .await;
        assert!(result.as_ref().is_err_and(DomainError::is_conflict));

        let mut current = CounterCommand::new(id);
        current.expected_version = Some(Version::new(2));
        let result = handler
            .update(&current, |c: &Counter| c.increment(1))
            .await
            .unwrap();
        assert_eq!(result.new_version, Version::new(3));
    }
}
