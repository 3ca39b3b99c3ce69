//! Core projection trait and position tracking.

use async_trait::async_trait;
use event_store::{EventEnvelope, Position};

use crate::Result;

/// Tracks how far into the global event order a projection has read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Store position of the last event seen.
    pub position: Position,

    /// Number of events seen, including ones the projection ignored.
    pub events_processed: u64,
}

impl ProjectionPosition {
    /// Creates a position before the first event.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Advances the position to `position`.
    pub fn advance(&self, position: Position) -> Self {
        Self {
            position,
            events_processed: self.events_processed + 1,
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "position({}, processed {})",
            self.position, self.events_processed
        )
    }
}

/// A projection that processes events and updates a read model.
///
/// Projections see every event in store order and must advance their
/// position for events they ignore, too.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Handles a single event, updating the projection's read model.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_starts_at_zero() {
        let pos = ProjectionPosition::zero();
        assert_eq!(pos.position, Position::start());
        assert_eq!(pos.events_processed, 0);
    }

    #[test]
    fn test_position_advances_to_store_position() {
        let pos = ProjectionPosition::zero().advance(Position::new(7));
        assert_eq!(pos.position, Position::new(7));
        assert_eq!(pos.events_processed, 1);

        let pos = pos.advance(Position::new(9));
        assert_eq!(pos.position, Position::new(9));
        assert_eq!(pos.events_processed, 2);
    }
}
