//! The unit the message bus dispatches: either a command or an event.

use serde::{Deserialize, Serialize};

use crate::product::{
    Allocate, Allocated, AllocationRequired, ChangeBatchQuantity, Command, CreateBatch,
    Deallocated, Event, OutOfStock,
};

/// A command or an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "message")]
pub enum Message {
    Command(Command),
    Event(Event),
}

impl Message {
    /// Returns the variant name of the wrapped command or event.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Command(command) => command.kind().as_str(),
            Message::Event(event) => event.kind().as_str(),
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Message::Command(_))
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message::Command(command)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}

macro_rules! into_message {
    ($($payload:ty => $family:ident),* $(,)?) => {
        $(
            impl From<$payload> for Message {
                fn from(payload: $payload) -> Self {
                    Message::$family($family::from(payload))
                }
            }
        )*
    };
}

into_message!(
    CreateBatch => Command,
    Allocate => Command,
    ChangeBatchQuantity => Command,
    OutOfStock => Event,
    Allocated => Event,
    Deallocated => Event,
    AllocationRequired => Event,
);
