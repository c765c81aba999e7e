//! Cross-thread handoff from the engine's stepping loop to the presentation
//! thread.
//!
//! The engine thread holds an [`EngineLink`] and posts raw callback records
//! without ever blocking. The presentation thread owns the matching
//! [`EngineInbox`] and drains it on its own schedule, preserving emission
//! order. The channel is unbounded so posting is lossless.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use msg_abi::RawEvent;
use smallvec::SmallVec;
use thiserror::Error;

pub type LinkResult<T> = Result<T, LinkError>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("engine inbox closed")]
    Closed,
}

/// Creates a connected link/inbox pair.
pub fn link() -> (EngineLink, EngineInbox) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let posted = Arc::new(AtomicU64::new(0));
    (
        EngineLink {
            tx,
            posted: Arc::clone(&posted),
        },
        EngineInbox { rx, posted },
    )
}

/// Engine-side sender. Cheap to clone; safe to call from any thread.
#[derive(Clone, Debug)]
pub struct EngineLink {
    tx: Sender<RawEvent>,
    posted: Arc<AtomicU64>,
}

impl EngineLink {
    /// Posts a raw event. Never blocks; fails only once the inbox is gone.
    pub fn post(&self, event: RawEvent) -> LinkResult<()> {
        // Counted before the send so `posted` never trails what was drained.
        self.posted.fetch_add(1, Ordering::AcqRel);
        self.tx.send(event).map_err(|_| {
            self.posted.fetch_sub(1, Ordering::AcqRel);
            LinkError::Closed
        })
    }

    /// Engine callback entry point: tag plus four data words.
    pub fn on_event(&self, kind: i64, d1: i64, d2: i64, d3: i64, d4: i64) -> LinkResult<()> {
        self.post(RawEvent::from_callback(kind, [d1, d2, d3, d4]))
    }
}

/// Presentation-side receiver.
#[derive(Debug)]
pub struct EngineInbox {
    rx: Receiver<RawEvent>,
    posted: Arc<AtomicU64>,
}

impl EngineInbox {
    /// Drains up to `max` events in emission order without blocking.
    pub fn drain(&self, max: usize) -> SmallVec<[RawEvent; 8]> {
        let mut out = SmallVec::new();
        while out.len() < max {
            match self.rx.try_recv() {
                Ok(event) => out.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Number of events posted but not yet drained.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Total events ever posted through any clone of the link.
    pub fn posted(&self) -> u64 {
        self.posted.load(Ordering::Acquire)
    }

    /// True once every [`EngineLink`] clone has been dropped.
    pub fn is_detached(&self) -> bool {
        Arc::strong_count(&self.posted) == 1
    }
}
