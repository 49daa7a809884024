//! Core aggregate and domain event traits.

use std::collections::vec_deque::Drain;

use common::Version;
use serde::{Serialize, de::DeserializeOwned};

use crate::message::Message;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// Used for logging, metrics labels, and outbound publication.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregate roots that buffer the messages their operations raise.
///
/// Domain methods append commands and events to an internal FIFO buffer.
/// The unit of work drains that buffer after a handler ran; draining is
/// destructive so a message is never delivered twice.
pub trait Aggregate: Send + Sync {
    /// Identity type of the aggregate.
    type Id: Clone + Eq + std::hash::Hash;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identity.
    fn id(&self) -> &Self::Id;

    /// Returns the current version of the aggregate.
    fn version(&self) -> Version;

    /// Number of messages waiting in the buffer.
    fn pending_messages(&self) -> usize;

    /// Drains the buffered messages in the order they were recorded.
    fn take_messages(&mut self) -> Drain<'_, Message>;
}
