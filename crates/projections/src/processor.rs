//! Projection processor for feeding events to projections.

use std::sync::Arc;

use event_store::{EventEnvelope, EventStore, Position};
use futures_util::StreamExt;
use tokio::sync::Mutex;

use crate::Result;
use crate::projection::Projection;

/// Processes events from an event store and delivers them to projections.
///
/// The processor supports:
/// - Catch-up: streams everything appended after the slowest projection's
///   position and delivers each event to the projections that have not seen it
/// - Single event delivery: delivers a new event to all projections
/// - Rebuild: resets all projections and replays from scratch
///
/// Catch-up runs are serialized, so concurrent callers never deliver the same
/// event twice.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Arc<dyn Projection>>,
    catch_up: Mutex<()>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    /// Creates a new processor with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
            catch_up: Mutex::new(()),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Arc<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Delivers every event the projections have not seen yet.
    ///
    /// Returns the number of events read from the store.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<u64> {
        let _guard = self.catch_up.lock().await;

        let mut from: Option<Position> = None;
        for projection in &self.projections {
            let position = projection.position().await.position;
            from = Some(from.map_or(position, |p| p.min(position)));
        }
        let Some(from) = from else {
            return Ok(0);
        };

        let mut stream = self.store.stream_all_from(from).await?;
        let mut events_read: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            events_read += 1;

            for projection in &self.projections {
                if projection.position().await.position < event.position {
                    projection.handle(&event).await?;
                    metrics::counter!("projections_events_processed", "projection" => projection.name())
                        .increment(1);
                }
            }
        }

        if events_read > 0 {
            tracing::info!(events_read, %from, "catch-up complete");
        }

        Ok(events_read)
    }

    /// Delivers a single event to all registered projections.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            projection.handle(event).await?;
        }
        Ok(())
    }

    /// Resets all projections and replays all events from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<u64> {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.run_catch_up().await
    }
}
