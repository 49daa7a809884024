//! Handler traits and the registries the message bus dispatches through.

use std::collections::HashMap;

use async_trait::async_trait;
use common::BatchRef;
use domain::{Command, CommandKind, Event, EventKind};
use storage::ProductStorage;

use crate::unit_of_work::UnitOfWork;
use crate::{Result, ServiceError};

/// What a command handler reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// The command ran and has nothing to report.
    Completed,
    /// The order line went to this batch.
    Allocated(BatchRef),
    /// No batch could take the order line.
    NotAllocated,
}

/// Handles one kind of command.
#[async_trait]
pub trait CommandHandler<S: ProductStorage>: Send + Sync {
    /// Returns the handler name, used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn handle(&self, command: &Command, uow: &mut UnitOfWork<S>) -> Result<CommandOutput>;
}

/// Reacts to one kind of event.
#[async_trait]
pub trait EventHandler<S: ProductStorage>: Send + Sync {
    /// Returns the handler name, used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &Event, uow: &mut UnitOfWork<S>) -> Result<()>;
}

/// Exactly one handler per command kind.
pub struct CommandHandlers<S: ProductStorage> {
    handlers: HashMap<CommandKind, Box<dyn CommandHandler<S>>>,
}

impl<S: ProductStorage> CommandHandlers<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers the handler for a command kind.
    ///
    /// Fails with `DuplicateHandler` if the kind already has one.
    pub fn register(
        &mut self,
        kind: CommandKind,
        handler: impl CommandHandler<S> + 'static,
    ) -> Result<()> {
        if self.handlers.contains_key(&kind) {
            return Err(ServiceError::DuplicateHandler(kind));
        }
        self.handlers.insert(kind, Box::new(handler));
        Ok(())
    }

    pub fn get(&self, kind: CommandKind) -> Option<&dyn CommandHandler<S>> {
        self.handlers.get(&kind).map(|handler| handler.as_ref())
    }

    /// Returns the first command kind without a handler, if any.
    pub fn missing(&self) -> Option<CommandKind> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| !self.handlers.contains_key(kind))
    }
}

impl<S: ProductStorage> Default for CommandHandlers<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero or more handlers per event kind, run in subscription order.
pub struct EventHandlers<S: ProductStorage> {
    handlers: HashMap<EventKind, Vec<Box<dyn EventHandler<S>>>>,
}

impl<S: ProductStorage> EventHandlers<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Adds a handler for an event kind.
    pub fn subscribe(&mut self, kind: EventKind, handler: impl EventHandler<S> + 'static) {
        self.handlers
            .entry(kind)
            .or_default()
            .push(Box::new(handler));
    }

    /// Returns the handlers for an event kind, in subscription order.
    pub fn for_kind(&self, kind: EventKind) -> &[Box<dyn EventHandler<S>>] {
        self.handlers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<S: ProductStorage> Default for EventHandlers<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the error for a handler that received the wrong message.
pub(crate) fn misrouted(handler: &'static str, message: &'static str) -> ServiceError {
    ServiceError::Misrouted { handler, message }
}

#[cfg(test)]
mod tests {
    use storage::InMemoryStorage;

    use super::*;

    struct Noop;

    #[async_trait]
    impl CommandHandler<InMemoryStorage> for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }

        async fn handle(
            &self,
            _command: &Command,
            _uow: &mut UnitOfWork<InMemoryStorage>,
        ) -> Result<CommandOutput> {
            Ok(CommandOutput::Completed)
        }
    }

    #[async_trait]
    impl EventHandler<InMemoryStorage> for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }

        async fn handle(&self, _event: &Event, _uow: &mut UnitOfWork<InMemoryStorage>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn registering_a_command_twice_fails() {
        let mut handlers = CommandHandlers::<InMemoryStorage>::new();
        handlers.register(CommandKind::Allocate, Noop).unwrap();

        let result = handlers.register(CommandKind::Allocate, Noop);
        assert!(matches!(
            result,
            Err(ServiceError::DuplicateHandler(CommandKind::Allocate))
        ));
    }

    #[test]
    fn missing_reports_uncovered_kind() {
        let mut handlers = CommandHandlers::<InMemoryStorage>::new();
        handlers.register(CommandKind::CreateBatch, Noop).unwrap();
        handlers.register(CommandKind::Allocate, Noop).unwrap();
        assert_eq!(handlers.missing(), Some(CommandKind::ChangeBatchQuantity));

        handlers
            .register(CommandKind::ChangeBatchQuantity, Noop)
            .unwrap();
        assert_eq!(handlers.missing(), None);
    }

    #[test]
    fn events_keep_subscription_order() {
        let mut handlers = EventHandlers::<InMemoryStorage>::new();
        handlers.subscribe(EventKind::Allocated, Noop);
        handlers.subscribe(EventKind::Allocated, Noop);

        assert_eq!(handlers.for_kind(EventKind::Allocated).len(), 2);
        assert!(handlers.for_kind(EventKind::OutOfStock).is_empty());
    }
}
