use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventEnvelope, EventStoreError, Position, Result, Version};

/// A stream of stored events in store order.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// Streams are append-only. The only ordering guarantee is a total order
/// of events within one stream; `position` additionally gives a stable
/// store-wide order for projections.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Prepares the backing storage. Safe to call on every startup.
    async fn initialize(&self) -> Result<()>;

    /// Appends a batch of events to one stream.
    ///
    /// The batch is stored atomically and contiguously at versions
    /// `expected_version + 1 ..= expected_version + n`, or not at all.
    /// Fails with [`EventStoreError::Conflict`] when the stream is not at
    /// `expected_version`.
    ///
    /// Returns the new version of the stream.
    async fn append(
        &self,
        stream_id: AggregateId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<Version>;

    /// Reads the events of a stream with a version of at least `from_version`,
    /// ordered by version.
    async fn read_stream(
        &self,
        stream_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Returns the current version of a stream, or `None` if it has no events.
    async fn stream_version(&self, stream_id: AggregateId) -> Result<Option<Version>>;

    /// Streams every event appended after `after`, in position order.
    async fn stream_all_from(&self, after: Position) -> Result<EventStream>;
}

#[async_trait]
impl<T: EventStore + ?Sized> EventStore for Arc<T> {
    async fn initialize(&self) -> Result<()> {
        (**self).initialize().await
    }

    async fn append(
        &self,
        stream_id: AggregateId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<Version> {
        (**self).append(stream_id, expected_version, events).await
    }

    async fn read_stream(
        &self,
        stream_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        (**self).read_stream(stream_id, from_version).await
    }

    async fn stream_version(&self, stream_id: AggregateId) -> Result<Option<Version>> {
        (**self).stream_version(stream_id).await
    }

    async fn stream_all_from(&self, after: Position) -> Result<EventStream> {
        (**self).stream_all_from(after).await
    }
}

/// Convenience methods available on every event store.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Reads a whole stream from its first event.
    async fn read_all(&self, stream_id: AggregateId) -> Result<Vec<EventEnvelope>> {
        self.read_stream(stream_id, Version::initial()).await
    }

    /// Checks whether a stream has any events.
    async fn stream_exists(&self, stream_id: AggregateId) -> Result<bool> {
        Ok(self.stream_version(stream_id).await?.is_some())
    }

    /// Streams every event in the store.
    async fn stream_all(&self) -> Result<EventStream> {
        self.stream_all_from(Position::start()).await
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Checks that a batch can be appended to `stream_id` at `expected_version`.
///
/// The batch must be non-empty, target a single stream and aggregate type,
/// and carry the versions directly following `expected_version`.
pub fn validate_batch(
    stream_id: AggregateId,
    expected_version: Version,
    events: &[EventEnvelope],
) -> Result<()> {
    let Some(first) = events.first() else {
        return Err(EventStoreError::InvalidBatch(
            "cannot append an empty batch".to_string(),
        ));
    };

    let mut version = expected_version;
    for event in events {
        if event.stream_id != stream_id {
            return Err(EventStoreError::InvalidBatch(format!(
                "event {} targets stream {} instead of {}",
                event.event_id, event.stream_id, stream_id
            )));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::InvalidBatch(
                "all events must have the same aggregate type".to_string(),
            ));
        }

        version = version.next();
        if event.version != version {
            return Err(EventStoreError::InvalidBatch(format!(
                "event versions must be contiguous: expected {}, got {}",
                version, event.version
            )));
        }
    }

    Ok(())
}
