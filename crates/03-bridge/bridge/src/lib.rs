//! Engine-to-presentation message bridge.
//!
//! A [`Bridge`] owns one [`EventChannel`] per catalog entry, the proxy
//! mirrors of engine aggregates, and the status surface. The engine hands
//! raw callback records to [`Bridge::dispatch`] (same context) or posts them
//! through an [`EngineLink`] (own thread) for [`Bridge::pump`] to drain.
//!
//! Every dispatched event goes through the same four steps, in order:
//! resolve the tag, report fatal conditions, invalidate affected mirrors,
//! fire the channel. Dispatch is a strict FIFO, also for events raised from
//! inside a subscriber.

mod config;
mod error;
/// Serializable view of bridge state for debug front-ends.
pub mod inspector;
mod router;
mod stats;
mod status;

pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use inspector::{BridgeVM, ChannelVM, MirrorVM};
pub use router::{Bridge, BridgeBuilder, WeakBridge};
pub use stats::DispatchCounters;
pub use status::{Status, StatusSurface};

pub use engine_link::{EngineLink, LinkError};
pub use event_channel::{ChannelSet, EventChannel, Notification, Stamp, Subscription};
pub use msg_abi::{ArgShape, MsgError, MsgGroup, MsgKind, Payload, RawEvent, StatusCode};
pub use proxy_mirror::{EngineQuery, Mirror, MirrorError, Mirrors, QueryError};
