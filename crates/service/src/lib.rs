//! Service layer for stock allocation.
//!
//! This crate provides:
//! - [`UnitOfWork`], the transactional scope handlers work in
//! - [`MessageBus`], which dispatches commands and events with retry
//! - The handlers and [`bootstrap()`] that wires them together
//! - Outbound [`Notifications`] and [`EventPublisher`] ports
//! - Read-side queries in [`views`]

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod messagebus;
pub mod notifications;
pub mod publisher;
pub mod registry;
pub mod retry;
pub mod unit_of_work;
pub mod views;

pub use bootstrap::{DEFAULT_NOTIFY_ADDRESS, Dependencies, bootstrap};
pub use error::{Result, ServiceError};
pub use messagebus::MessageBus;
pub use notifications::{InMemoryNotifications, LogNotifications, Notifications};
pub use publisher::{BroadcastPublisher, EventPublisher, PublishedMessage};
pub use registry::{CommandHandler, CommandHandlers, CommandOutput, EventHandler, EventHandlers};
pub use retry::RetryPolicy;
pub use unit_of_work::{UnitOfWork, UnitOfWorkScope};
pub use views::BatchSummary;
