//! Per-kind occurrence counters with synchronous fan-out.
//!
//! A change-detection substrate cannot represent two identical occurrences in
//! a row. Each message kind therefore gets an [`EventChannel`] whose value is
//! a wrapping occurrence counter, and every write notifies subscribers
//! regardless of whether anything "changed".
//!
//! # Invariants
//!
//! 1. Each [`EventChannel::fire`] advances the counter by exactly one and
//!    notifies every attached subscriber exactly once.
//! 2. Counters are never decremented or reset while the channel lives.
//! 3. A subscriber sees the current stamp on attach and every later write.
//! 4. Dropping a [`Subscription`] stops delivery to that subscriber only;
//!    other subscribers of an in-flight write are unaffected.

mod channel;
mod set;
mod stamp;

pub use channel::{EventChannel, Notification, Subscription};
pub use set::ChannelSet;
pub use stamp::Stamp;
