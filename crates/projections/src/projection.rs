//! Projection trait and progress tracking.

use async_trait::async_trait;
use domain::Event;

/// How far a projection has got through the event stream.
///
/// `seen` counts every event handed to the projection, `applied` only those
/// that changed its read model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    pub seen: u64,
    pub applied: u64,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns the position after one more event.
    pub fn record(self, applied: bool) -> Self {
        Self {
            seen: self.seen + 1,
            applied: self.applied + u64::from(applied),
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} applied", self.applied, self.seen)
    }
}

/// Keeps a read model in step with domain events.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    /// Applies one event. Events the projection ignores still count as seen.
    async fn handle(&self, event: &Event);

    async fn position(&self) -> ProjectionPosition;

    /// Empties the read model and rewinds the position.
    async fn reset(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_seen_and_applied() {
        let pos = ProjectionPosition::zero().record(true).record(false).record(true);
        assert_eq!(pos, ProjectionPosition { seen: 3, applied: 2 });
    }

    #[test]
    fn display_shows_ratio() {
        let pos = ProjectionPosition { seen: 4, applied: 1 };
        assert_eq!(pos.to_string(), "1/4 applied");
    }
}
