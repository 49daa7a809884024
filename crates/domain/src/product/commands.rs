//! Product commands.

use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};

/// Commands express an intent. Each kind has exactly one handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    /// Register a new batch of stock.
    CreateBatch(CreateBatch),

    /// Allocate an order line to a batch.
    Allocate(Allocate),

    /// Correct the purchased quantity of a batch.
    ChangeBatchQuantity(ChangeBatchQuantity),
}

/// Tag identifying a command variant, used as handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CreateBatch,
    Allocate,
    ChangeBatchQuantity,
}

impl CommandKind {
    /// Every command kind. A message bus must have a handler for each.
    pub const ALL: [CommandKind; 3] = [
        CommandKind::CreateBatch,
        CommandKind::Allocate,
        CommandKind::ChangeBatchQuantity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CreateBatch => "CreateBatch",
            CommandKind::Allocate => "Allocate",
            CommandKind::ChangeBatchQuantity => "ChangeBatchQuantity",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CreateBatch(_) => CommandKind::CreateBatch,
            Command::Allocate(_) => CommandKind::Allocate,
            Command::ChangeBatchQuantity(_) => CommandKind::ChangeBatchQuantity,
        }
    }
}

/// Command to register a batch. A batch without `eta` is in stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBatch {
    pub batchref: BatchRef,
    pub sku: Sku,
    pub qty: u32,
    pub eta: Option<NaiveDate>,
}

impl CreateBatch {
    pub fn new(
        batchref: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        qty: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Self {
            batchref: batchref.into(),
            sku: sku.into(),
            qty,
            eta,
        }
    }
}

/// Command to allocate `qty` units of `sku` for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocate {
    pub orderid: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

impl Allocate {
    pub fn new(orderid: impl Into<OrderId>, sku: impl Into<Sku>, qty: u32) -> Self {
        Self {
            orderid: orderid.into(),
            sku: sku.into(),
            qty,
        }
    }
}

/// Command to set the purchased quantity of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatchQuantity {
    pub batchref: BatchRef,
    pub qty: u32,
}

impl ChangeBatchQuantity {
    pub fn new(batchref: impl Into<BatchRef>, qty: u32) -> Self {
        Self {
            batchref: batchref.into(),
            qty,
        }
    }
}

impl From<CreateBatch> for Command {
    fn from(cmd: CreateBatch) -> Self {
        Command::CreateBatch(cmd)
    }
}

impl From<Allocate> for Command {
    fn from(cmd: Allocate) -> Self {
        Command::Allocate(cmd)
    }
}

impl From<ChangeBatchQuantity> for Command {
    fn from(cmd: ChangeBatchQuantity) -> Self {
        Command::ChangeBatchQuantity(cmd)
    }
}
