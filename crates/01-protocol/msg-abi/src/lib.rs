//! Message ABI shared between the engine boundary and the bridge.
//!
//! This crate defines the closed message taxonomy emitted by the emulator
//! engine, the per-kind payload shapes, the raw callback record, and the
//! status codes surfaced to the presentation layer. It carries no behaviour
//! beyond resolution and validation.

mod error;
mod kind;
mod payload;
mod status;

pub use error::{MsgError, MsgResult};
pub use kind::{MsgGroup, MsgKind};
pub use payload::{ArgShape, Payload, RawEvent};
pub use status::StatusCode;
