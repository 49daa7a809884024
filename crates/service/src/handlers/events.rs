//! Event handlers.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{Allocate, Event};
use projections::Projection;
use storage::ProductStorage;

use crate::notifications::Notifications;
use crate::publisher::EventPublisher;
use crate::registry::{EventHandler, misrouted};
use crate::unit_of_work::UnitOfWork;
use crate::{Result, ServiceError};

/// Channel `Allocated` events are published on.
pub const LINE_ALLOCATED_CHANNEL: &str = "line_allocated";

/// Handles `AllocationRequired` by queueing an `Allocate` for the line.
pub struct ReallocateHandler;

#[async_trait]
impl<S: ProductStorage> EventHandler<S> for ReallocateHandler {
    fn name(&self) -> &'static str {
        "reallocate"
    }

    #[tracing::instrument(skip_all, fields(handler = "reallocate"))]
    async fn handle(&self, event: &Event, uow: &mut UnitOfWork<S>) -> Result<()> {
        let Event::AllocationRequired(required) = event else {
            return Err(misrouted("reallocate", event.kind().as_str()));
        };

        let mut scope = uow.begin().await?;
        let product = scope
            .products
            .get(&required.sku)
            .await?
            .ok_or_else(|| ServiceError::InvalidSku(required.sku.clone()))?;
        product.record(Allocate::from(required.clone()));
        scope.commit().await?;

        tracing::debug!(orderid = %required.orderid, sku = %required.sku, "Reallocation queued");
        Ok(())
    }
}

/// Notifies the stock team when a sku runs out.
pub struct OutOfStockNotifier {
    notifications: Arc<dyn Notifications>,
    destination: String,
}

impl OutOfStockNotifier {
    pub fn new(notifications: Arc<dyn Notifications>, destination: impl Into<String>) -> Self {
        Self {
            notifications,
            destination: destination.into(),
        }
    }
}

#[async_trait]
impl<S: ProductStorage> EventHandler<S> for OutOfStockNotifier {
    fn name(&self) -> &'static str {
        "send_out_of_stock_notification"
    }

    async fn handle(&self, event: &Event, _uow: &mut UnitOfWork<S>) -> Result<()> {
        let Event::OutOfStock(out_of_stock) = event else {
            return Err(misrouted(
                "send_out_of_stock_notification",
                event.kind().as_str(),
            ));
        };

        self.notifications
            .send(
                &self.destination,
                &format!("Out of stock for {}", out_of_stock.sku),
            )
            .await
    }
}

/// Publishes `Allocated` events for external consumers.
pub struct AllocatedPublisher {
    publisher: Arc<dyn EventPublisher>,
}

impl AllocatedPublisher {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl<S: ProductStorage> EventHandler<S> for AllocatedPublisher {
    fn name(&self) -> &'static str {
        "publish_allocated_event"
    }

    async fn handle(&self, event: &Event, _uow: &mut UnitOfWork<S>) -> Result<()> {
        let Event::Allocated(allocated) = event else {
            return Err(misrouted("publish_allocated_event", event.kind().as_str()));
        };

        let payload = serde_json::to_value(allocated)?;
        self.publisher.publish(LINE_ALLOCATED_CHANNEL, payload).await
    }
}

/// Applies events to a read model.
pub struct ProjectionHandler {
    projection: Arc<dyn Projection>,
}

impl ProjectionHandler {
    pub fn new(projection: Arc<dyn Projection>) -> Self {
        Self { projection }
    }
}

#[async_trait]
impl<S: ProductStorage> EventHandler<S> for ProjectionHandler {
    fn name(&self) -> &'static str {
        self.projection.name()
    }

    async fn handle(&self, event: &Event, _uow: &mut UnitOfWork<S>) -> Result<()> {
        self.projection.handle(event).await;
        Ok(())
    }
}
