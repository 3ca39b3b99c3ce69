//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name stored alongside the payload.
    fn event_type(&self) -> &'static str;
}

/// Trait for event-sourced aggregates.
///
/// An aggregate is a plain value rebuilt by folding its event stream:
/// - `apply` is pure and deterministic and never fails
/// - command methods take `&self`, run guards and return the events to
///   stage; they never touch the event store
pub trait Aggregate: Default + Clone + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identifier, or `None` before creation.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the number of events applied so far.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by the aggregate handler after applying an event.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    fn apply(&mut self, event: Self::Event);

    /// Deleted aggregates are treated as missing by update commands.
    fn is_deleted(&self) -> bool {
        false
    }

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Rebuilds an aggregate from the beginning of its history.
    fn replay(events: impl IntoIterator<Item = Self::Event>) -> Self {
        let mut aggregate = Self::default();
        for event in events {
            aggregate.apply(event);
            aggregate.set_version(aggregate.version().next());
        }
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum TestEvent {
        Created { id: AggregateId },
        Updated { value: i32 },
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Created { .. } => "TestCreated",
                TestEvent::Updated { .. } => "TestUpdated",
            }
        }
    }

    #[derive(Debug, Default, Clone)]
    struct TestAggregate {
        id: Option<AggregateId>,
        value: i32,
        version: Version,
    }

    impl Aggregate for TestAggregate {
        type Event = TestEvent;

        fn aggregate_type() -> &'static str {
            "TestAggregate"
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

        fn apply(&mut self, event: Self::Event) {
            match event {
                TestEvent::Created { id } => self.id = Some(id),
                TestEvent::Updated { value } => self.value = value,
            }
        }
    }

    #[test]
    fn test_aggregate_apply_events() {
        let mut aggregate = TestAggregate::default();
        let id = AggregateId::new();

        aggregate.apply_events(vec![TestEvent::Created { id }, TestEvent::Updated { value: 42 }]);

        assert_eq!(aggregate.id(), Some(id));
        assert_eq!(aggregate.value, 42);
        assert!(!aggregate.is_deleted());
    }

    #[test]
    fn test_replay_counts_versions() {
        let aggregate = TestAggregate::replay(vec![
            TestEvent::Created { id: AggregateId::new() },
            TestEvent::Updated { value: 1 },
            TestEvent::Updated { value: 2 },
        ]);

        assert_eq!(aggregate.version(), Version::new(3));
        assert_eq!(aggregate.value, 2);
    }

    #[test]
    fn test_domain_event_type() {
        let event = TestEvent::Created { id: AggregateId::new() };
        assert_eq!(event.event_type(), "TestCreated");

        let event = TestEvent::Updated { value: 42 };
        assert_eq!(event.event_type(), "TestUpdated");
    }
}
