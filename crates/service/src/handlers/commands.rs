//! Command handlers.

use async_trait::async_trait;
use domain::{Batch, Command, OrderLine};
use storage::ProductStorage;

use crate::registry::{CommandHandler, CommandOutput, misrouted};
use crate::unit_of_work::UnitOfWork;
use crate::{Result, ServiceError};

/// Handles `CreateBatch`: adds the batch, creating the product if needed.
pub struct AddBatchHandler;

#[async_trait]
impl<S: ProductStorage> CommandHandler<S> for AddBatchHandler {
    fn name(&self) -> &'static str {
        "add_batch"
    }

    #[tracing::instrument(skip_all, fields(handler = "add_batch"))]
    async fn handle(&self, command: &Command, uow: &mut UnitOfWork<S>) -> Result<CommandOutput> {
        let Command::CreateBatch(cmd) = command else {
            return Err(misrouted("add_batch", command.kind().as_str()));
        };

        let mut scope = uow.begin().await?;
        let product = scope.products.get_or_add(&cmd.sku).await?;
        product.add_batch(Batch::new(
            cmd.batchref.clone(),
            cmd.sku.clone(),
            cmd.qty,
            cmd.eta,
        ))?;
        scope.commit().await?;

        tracing::info!(batchref = %cmd.batchref, sku = %cmd.sku, qty = cmd.qty, "Batch added");
        Ok(CommandOutput::Completed)
    }
}

/// Handles `Allocate`: allocates the line to the product's preferred batch.
///
/// Fails with `InvalidSku` when no product exists for the sku.
pub struct AllocateHandler;

#[async_trait]
impl<S: ProductStorage> CommandHandler<S> for AllocateHandler {
    fn name(&self) -> &'static str {
        "allocate"
    }

    #[tracing::instrument(skip_all, fields(handler = "allocate"))]
    async fn handle(&self, command: &Command, uow: &mut UnitOfWork<S>) -> Result<CommandOutput> {
        let Command::Allocate(cmd) = command else {
            return Err(misrouted("allocate", command.kind().as_str()));
        };

        let line = OrderLine::new(cmd.orderid.clone(), cmd.sku.clone(), cmd.qty)?;

        let mut scope = uow.begin().await?;
        let product = scope
            .products
            .get(&cmd.sku)
            .await?
            .ok_or_else(|| ServiceError::InvalidSku(cmd.sku.clone()))?;
        let batchref = product.allocate(line);
        scope.commit().await?;

        Ok(match batchref {
            Some(batchref) => {
                tracing::info!(orderid = %cmd.orderid, %batchref, "Order line allocated");
                CommandOutput::Allocated(batchref)
            }
            None => CommandOutput::NotAllocated,
        })
    }
}

/// Handles `ChangeBatchQuantity`: resizes the batch, shedding lines that no
/// longer fit.
pub struct ChangeBatchQuantityHandler;

#[async_trait]
impl<S: ProductStorage> CommandHandler<S> for ChangeBatchQuantityHandler {
    fn name(&self) -> &'static str {
        "change_batch_quantity"
    }

    #[tracing::instrument(skip_all, fields(handler = "change_batch_quantity"))]
    async fn handle(&self, command: &Command, uow: &mut UnitOfWork<S>) -> Result<CommandOutput> {
        let Command::ChangeBatchQuantity(cmd) = command else {
            return Err(misrouted("change_batch_quantity", command.kind().as_str()));
        };

        let mut scope = uow.begin().await?;
        let product = scope
            .products
            .get_by_batchref(&cmd.batchref)
            .await?
            .ok_or_else(|| ServiceError::UnknownBatch(cmd.batchref.clone()))?;
        product.change_batch_quantity(&cmd.batchref, cmd.qty)?;
        scope.commit().await?;

        tracing::info!(batchref = %cmd.batchref, qty = cmd.qty, "Batch quantity changed");
        Ok(CommandOutput::Completed)
    }
}
