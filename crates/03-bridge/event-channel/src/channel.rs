use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use msg_abi::{MsgKind, Payload};
use parking_lot::Mutex;

use crate::stamp::Stamp;

/// What a subscriber receives on attach and on every write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Notification<'a> {
    pub kind: MsgKind,
    pub stamp: Stamp,
    /// Payload recorded by the most recent write, if the kind carries one.
    pub value: Option<&'a Payload>,
}

type Observer = Box<dyn Fn(&Notification<'_>) + Send + Sync>;

struct Slot {
    id: u64,
    active: AtomicBool,
    observer: Observer,
}

type SlotList = Mutex<Vec<Arc<Slot>>>;

/// Occurrence counter for a single message kind.
pub struct EventChannel {
    kind: MsgKind,
    count: AtomicU32,
    last_value: Mutex<Option<Payload>>,
    slots: Arc<SlotList>,
    next_id: AtomicU64,
}

impl EventChannel {
    pub fn new(kind: MsgKind) -> Self {
        Self::starting_at(kind, Stamp::ZERO)
    }

    /// Creates a channel whose counter starts at `stamp` instead of zero.
    pub fn starting_at(kind: MsgKind, stamp: Stamp) -> Self {
        Self {
            kind,
            count: AtomicU32::new(stamp.get()),
            last_value: Mutex::new(None),
            slots: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn kind(&self) -> MsgKind {
        self.kind
    }

    /// Current occurrence count.
    pub fn stamp(&self) -> Stamp {
        Stamp::new(self.count.load(Ordering::Acquire))
    }

    /// Payload captured at the most recent write that carried one.
    pub fn last_value(&self) -> Option<Payload> {
        self.last_value.lock().clone()
    }

    /// Number of occurrences since `baseline`, wraparound-safe.
    pub fn fired_since(&self, baseline: Stamp) -> u32 {
        self.stamp().since(baseline)
    }

    pub fn subscriber_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Records one occurrence without touching the last value.
    pub fn increment(&self) -> Stamp {
        self.fire(None)
    }

    /// Records one occurrence, optionally replacing the last value, then
    /// notifies every attached subscriber.
    ///
    /// Writers must be serialized by the caller; the router is the only
    /// writer in practice.
    pub fn fire(&self, value: Option<Payload>) -> Stamp {
        let value = {
            let mut last = self.last_value.lock();
            if value.is_some() {
                *last = value;
            }
            last.clone()
        };
        let stamp = Stamp::new(self.count.fetch_add(1, Ordering::AcqRel)).next();
        self.notify(stamp, value.as_ref());
        stamp
    }

    /// Attaches `observer`. It is called with the current stamp right away
    /// and again on every subsequent write until the returned handle drops.
    #[must_use = "dropping the subscription detaches the observer"]
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Notification<'_>) + Send + Sync + 'static,
    {
        let slot = Arc::new(Slot {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            active: AtomicBool::new(true),
            observer: Box::new(observer),
        });
        self.slots.lock().push(Arc::clone(&slot));

        let value = self.last_value();
        (slot.observer)(&Notification {
            kind: self.kind,
            stamp: self.stamp(),
            value: value.as_ref(),
        });

        Subscription {
            kind: self.kind,
            slot: Arc::downgrade(&slot),
            id: slot.id,
            registry: Arc::downgrade(&self.slots),
        }
    }

    fn notify(&self, stamp: Stamp, value: Option<&Payload>) {
        // Observers run without the list lock held so they may subscribe,
        // detach, or dispatch further events.
        let snapshot: Vec<Arc<Slot>> = self.slots.lock().clone();
        let note = Notification {
            kind: self.kind,
            stamp,
            value,
        };
        for slot in snapshot {
            if slot.active.load(Ordering::Acquire) {
                (slot.observer)(&note);
            }
        }
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("kind", &self.kind)
            .field("stamp", &self.stamp())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Detach handle returned by [`EventChannel::subscribe`]. Detaches on drop.
pub struct Subscription {
    kind: MsgKind,
    id: u64,
    slot: Weak<Slot>,
    registry: Weak<SlotList>,
}

impl Subscription {
    pub fn kind(&self) -> MsgKind {
        self.kind
    }

    /// Stops delivery immediately. Equivalent to dropping the handle.
    pub fn detach(self) {}

    /// Keeps the observer attached for the channel's whole lifetime.
    pub fn forget(self) {
        let mut this = std::mem::ManuallyDrop::new(self);
        this.slot = Weak::new();
        this.registry = Weak::new();
    }

    fn release(&mut self) {
        if let Some(slot) = self.slot.upgrade() {
            slot.active.store(false, Ordering::Release);
        }
        if let Some(registry) = self.registry.upgrade() {
            let id = self.id;
            registry.lock().retain(|slot| slot.id != id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}
