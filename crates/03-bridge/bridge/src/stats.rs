use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Point-in-time copy of the router's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchCounters {
    /// Events that reached a channel.
    pub dispatched: u64,
    /// Events dropped because their tag was not in the catalog.
    pub unknown: u64,
    /// Events whose payload did not match the kind's shape.
    pub malformed: u64,
    /// Fatal engine signals.
    pub fatal: u64,
    /// Dispatch calls that arrived while a drain was already running.
    pub queued_behind: u64,
    /// Deepest the dispatch queue has been.
    pub peak_queue: usize,
}

#[derive(Debug, Default)]
pub(crate) struct DispatchStats {
    dispatched: AtomicU64,
    unknown: AtomicU64,
    malformed: AtomicU64,
    fatal: AtomicU64,
    queued_behind: AtomicU64,
    peak_queue: AtomicUsize,
}

impl DispatchStats {
    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unknown(&self) {
        self.unknown.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fatal(&self) {
        self.fatal.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_queued_behind(&self) {
        self.queued_behind.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn observe_depth(&self, depth: usize) {
        self.peak_queue.fetch_max(depth, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> DispatchCounters {
        DispatchCounters {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            fatal: self.fatal.load(Ordering::Relaxed),
            queued_behind: self.queued_behind.load(Ordering::Relaxed),
            peak_queue: self.peak_queue.load(Ordering::Relaxed),
        }
    }
}
