use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bridge::{EventChannel, MsgKind, Payload, RawEvent, Stamp};
use mock_engine::make_bridge;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::support::{init_logging, journal, record};

#[test]
fn twice_means_two_increments_and_two_notifications() {
    init_logging();
    let (bridge, _) = make_bridge();
    let log = journal();
    let _first = record(&bridge, MsgKind::WarpOn, &log);
    let _second = record(&bridge, MsgKind::WarpOn, &log);
    let before = bridge.stamp(MsgKind::WarpOn);

    bridge.on_event(MsgKind::WarpOn.raw(), 0, 0, 0, 0);
    bridge.on_event(MsgKind::WarpOn.raw(), 0, 0, 0, 0);

    assert_eq!(bridge.stamp(MsgKind::WarpOn).since(before), 2);
    assert_eq!(log.lock().len(), 4);
}

#[test]
fn identical_payloads_are_not_coalesced() {
    let (bridge, _) = make_bridge();
    let log = journal();
    let _sub = record(&bridge, MsgKind::DriveLedOn, &log);

    bridge.dispatch(RawEvent::of(MsgKind::DriveLedOn, &[0]));
    bridge.dispatch(RawEvent::of(MsgKind::DriveLedOn, &[0]));

    assert_eq!(
        *log.lock(),
        vec![
            (MsgKind::DriveLedOn, Stamp::new(1), Some(Payload::Int(0))),
            (MsgKind::DriveLedOn, Stamp::new(2), Some(Payload::Int(0))),
        ]
    );
}

#[test]
fn late_subscriber_sees_next_write_only() {
    let (bridge, _) = make_bridge();
    for _ in 0..5 {
        bridge.on_event(MsgKind::SerIn.raw(), 0x41, 0, 0, 0);
    }

    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = bridge.subscribe(MsgKind::SerIn, move |note| sink.lock().push(note.stamp));
    bridge.on_event(MsgKind::SerIn.raw(), 0x42, 0, 0, 0);

    assert_eq!(*seen.lock(), vec![Stamp::new(5), Stamp::new(6)]);
}

#[test]
fn wraparound_keeps_fired_since_correct() {
    let channel = EventChannel::starting_at(MsgKind::DriveStep, Stamp::new(u32::MAX - 1));
    let baseline = channel.stamp();

    channel.increment();
    assert_eq!(channel.stamp(), Stamp::new(u32::MAX));
    channel.increment();
    assert_eq!(channel.stamp(), Stamp::ZERO);
    channel.increment();

    assert_eq!(channel.fired_since(baseline), 3);
    assert!(channel.stamp().is_newer_than(baseline));
}

#[test]
fn unsubscribed_observer_is_not_called() {
    let (bridge, _) = make_bridge();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let sub = bridge.subscribe(MsgKind::Shaking, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    bridge.on_event(MsgKind::Shaking.raw(), 0, 0, 0, 0);
    sub.detach();
    bridge.on_event(MsgKind::Shaking.raw(), 0, 0, 0, 0);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(bridge.channel(MsgKind::Shaking).subscriber_count(), 0);
}

fn any_kind() -> impl Strategy<Value = MsgKind> {
    (0..MsgKind::COUNT).prop_map(|idx| MsgKind::ALL[idx])
}

proptest! {
    #[test]
    fn counts_track_occurrences_per_kind(kinds in proptest::collection::vec(any_kind(), 0..64)) {
        let (bridge, _) = make_bridge();
        let mut expected: HashMap<MsgKind, u32> = HashMap::new();
        for kind in &kinds {
            bridge.dispatch(RawEvent::from_callback(kind.raw(), [0, 0, 0, 0]));
            *expected.entry(*kind).or_default() += 1;
        }
        for kind in MsgKind::ALL {
            let count = expected.get(kind).copied().unwrap_or(0);
            prop_assert_eq!(bridge.stamp(*kind).get(), count, "{}", kind);
        }
    }
}
