//! Value objects for the product domain.

use common::{OrderId, Sku};
use serde::{Deserialize, Serialize};

use super::ProductError;

/// A customer order line: some quantity of one sku for one order.
///
/// Equality and hashing are structural over all three fields, so two lines
/// with the same order, sku and quantity are the same line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLine {
    orderid: OrderId,
    sku: Sku,
    qty: u32,
}

impl OrderLine {
    /// Creates a new order line. The quantity must be positive.
    pub fn new(
        orderid: impl Into<OrderId>,
        sku: impl Into<Sku>,
        qty: u32,
    ) -> Result<Self, ProductError> {
        if qty == 0 {
            return Err(ProductError::InvalidQuantity { qty });
        }

        Ok(Self {
            orderid: orderid.into(),
            sku: sku.into(),
            qty,
        })
    }

    pub fn orderid(&self) -> &OrderId {
        &self.orderid
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn qty(&self) -> u32 {
        self.qty
    }
}
