use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Position, Result, Version,
    store::{EventStore, EventStream, validate_batch},
};

#[derive(Default)]
struct Log {
    /// Every event in append order; `log[i]` has position `i + 1`.
    events: Vec<EventEnvelope>,
    /// Indexes into `events`, per stream, in version order.
    streams: HashMap<AggregateId, Vec<usize>>,
}

impl Log {
    fn stream_version(&self, stream_id: AggregateId) -> Version {
        self.streams
            .get(&stream_id)
            .map(|indexes| Version::new(indexes.len() as i64))
            .unwrap_or_else(Version::initial)
    }
}

/// In-memory event store.
///
/// The whole log sits behind one lock, so the version check and the
/// append of a batch happen as a single step.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<Log>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.log.read().await.events.len()
    }

    /// Drops every stream.
    pub async fn clear(&self) {
        let mut log = self.log.write().await;
        log.events.clear();
        log.streams.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn append(
        &self,
        stream_id: AggregateId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<Version> {
        validate_batch(stream_id, expected_version, &events)?;

        let mut log = self.log.write().await;

        let actual = log.stream_version(stream_id);
        if actual != expected_version {
            return Err(EventStoreError::Conflict {
                stream_id,
                expected: expected_version,
                actual,
            });
        }

        let count = events.len();
        let mut new_version = actual;
        for mut event in events {
            let index = log.events.len();
            event.position = Position::new(index as i64 + 1);
            new_version = event.version;
            log.events.push(event);
            log.streams.entry(stream_id).or_default().push(index);
        }

        metrics::counter!("events_appended").increment(count as u64);
        tracing::debug!(%stream_id, %new_version, count, "appended events");

        Ok(new_version)
    }

    async fn read_stream(
        &self,
        stream_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        let events = log
            .streams
            .get(&stream_id)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&index| &log.events[index])
                    .filter(|event| event.version >= from_version)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(events)
    }

    async fn stream_version(&self, stream_id: AggregateId) -> Result<Option<Version>> {
        let log = self.log.read().await;
        Ok(log
            .streams
            .get(&stream_id)
            .map(|indexes| Version::new(indexes.len() as i64)))
    }

    async fn stream_all_from(&self, after: Position) -> Result<EventStream> {
        let log = self.log.read().await;
        let skip = usize::try_from(after.as_i64()).unwrap_or(0);
        let events: Vec<EventEnvelope> = log.events.iter().skip(skip).cloned().collect();
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }
}
