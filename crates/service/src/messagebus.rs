//! Message bus dispatching commands and events to their handlers.

use std::collections::VecDeque;

use domain::{Command, Event, Message};
use storage::ProductStorage;

use crate::registry::{CommandHandlers, CommandOutput, EventHandlers};
use crate::retry::RetryPolicy;
use crate::unit_of_work::UnitOfWork;
use crate::{Result, ServiceError};

/// Routes messages to handlers and feeds the messages they raise back in.
///
/// A call to [`MessageBus::handle`] processes a FIFO queue seeded with one
/// message until it is empty. Command failures abort the call; event
/// handler failures are retried per the [`RetryPolicy`] and then dropped.
pub struct MessageBus<S: ProductStorage> {
    storage: S,
    commands: CommandHandlers<S>,
    events: EventHandlers<S>,
    retry: RetryPolicy,
}

impl<S: ProductStorage> MessageBus<S> {
    /// Creates a bus. Every command kind must have a handler.
    pub fn new(
        storage: S,
        commands: CommandHandlers<S>,
        events: EventHandlers<S>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        if let Some(kind) = commands.missing() {
            return Err(ServiceError::NoHandler(kind));
        }

        Ok(Self {
            storage,
            commands,
            events,
            retry,
        })
    }

    /// Creates a unit of work over the bus's storage.
    pub fn unit_of_work(&self) -> UnitOfWork<S> {
        UnitOfWork::new(self.storage.clone())
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Handles a message and everything it causes.
    ///
    /// Returns the outputs of every command processed, in order.
    #[tracing::instrument(skip_all, fields(message = tracing::field::Empty))]
    pub async fn handle(
        &self,
        message: impl Into<Message>,
        uow: &mut UnitOfWork<S>,
    ) -> Result<Vec<CommandOutput>> {
        let message = message.into();
        tracing::Span::current().record("message", message.name());

        let mut queue = VecDeque::from([message]);
        let mut results = Vec::new();

        while let Some(message) = queue.pop_front() {
            match message {
                Message::Event(event) => self.handle_event(&event, uow, &mut queue).await,
                Message::Command(command) => {
                    let output = self.handle_command(&command, uow, &mut queue).await?;
                    results.push(output);
                }
            }
        }

        Ok(results)
    }

    async fn handle_event(
        &self,
        event: &Event,
        uow: &mut UnitOfWork<S>,
        queue: &mut VecDeque<Message>,
    ) {
        let kind = event.kind();

        for handler in self.events.for_kind(kind) {
            let mut attempt = 1;
            loop {
                tracing::debug!(handler = handler.name(), event = %kind, attempt, "Handling event");

                match handler.handle(event, uow).await {
                    Ok(()) => {
                        queue.extend(uow.collect_new_events());
                        break;
                    }
                    Err(error) => {
                        uow.discard_seen();

                        if !self.retry.should_retry(attempt) {
                            metrics::counter!(
                                "messagebus_event_handler_failures_total",
                                "handler" => handler.name()
                            )
                            .increment(1);
                            tracing::error!(
                                handler = handler.name(),
                                event = %kind,
                                attempts = attempt,
                                %error,
                                "Event handler failed, giving up"
                            );
                            break;
                        }

                        let delay = self.retry.delay_for_attempt(attempt);
                        metrics::counter!(
                            "messagebus_event_retries_total",
                            "handler" => handler.name()
                        )
                        .increment(1);
                        tracing::warn!(
                            handler = handler.name(),
                            event = %kind,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            %error,
                            "Event handler failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                }
            }
        }
    }

    async fn handle_command(
        &self,
        command: &Command,
        uow: &mut UnitOfWork<S>,
        queue: &mut VecDeque<Message>,
    ) -> Result<CommandOutput> {
        let kind = command.kind();
        let handler = self
            .commands
            .get(kind)
            .ok_or(ServiceError::NoHandler(kind))?;

        metrics::counter!("messagebus_commands_total", "command" => kind.as_str()).increment(1);
        let start = std::time::Instant::now();

        match handler.handle(command, uow).await {
            Ok(output) => {
                metrics::histogram!("messagebus_command_duration_seconds", "command" => kind.as_str())
                    .record(start.elapsed().as_secs_f64());
                tracing::debug!(command = %kind, ?output, "Command handled");
                queue.extend(uow.collect_new_events());
                Ok(output)
            }
            Err(error) => {
                uow.discard_seen();
                metrics::counter!("messagebus_command_failures_total", "command" => kind.as_str())
                    .increment(1);
                tracing::error!(command = %kind, %error, "Command handler failed");
                Err(error)
            }
        }
    }
}
