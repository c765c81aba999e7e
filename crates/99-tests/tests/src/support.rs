use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridge::{Bridge, MsgKind, Notification, Payload, Stamp, Subscription};
use parking_lot::Mutex;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Shared log of notifications delivered after attach.
pub type Journal = Arc<Mutex<Vec<(MsgKind, Stamp, Option<Payload>)>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

/// Subscribes `kind`, skipping the attach-time call and recording every
/// later notification.
pub fn record(bridge: &Bridge, kind: MsgKind, journal: &Journal) -> Subscription {
    let journal = Arc::clone(journal);
    let primed = AtomicBool::new(false);
    bridge.subscribe(kind, move |note: &Notification<'_>| {
        if !primed.swap(true, Ordering::SeqCst) {
            return;
        }
        journal
            .lock()
            .push((note.kind, note.stamp, note.value.cloned()));
    })
}

/// Kinds recorded so far, in delivery order.
pub fn kinds(journal: &Journal) -> Vec<MsgKind> {
    journal.lock().iter().map(|(kind, _, _)| *kind).collect()
}
