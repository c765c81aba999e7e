use std::sync::Arc;

use bridge::{BridgeConfig, MsgKind, RawEvent, Stamp, StatusCode, Subscription};
use mock_engine::{make_bridge, make_bridge_with};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::support::{init_logging, journal, kinds, record};

#[test]
fn disk_insert_eject_sequence() {
    init_logging();
    let (bridge, engine) = make_bridge();
    let mut insert = vec![bridge.stamp(MsgKind::DiskInsert).get()];
    let mut eject = vec![bridge.stamp(MsgKind::DiskEject).get()];

    for kind in [MsgKind::DiskInsert, MsgKind::DiskEject, MsgKind::DiskInsert] {
        engine.emit(&bridge, RawEvent::of(kind, &[0]));
        insert.push(bridge.stamp(MsgKind::DiskInsert).get());
        eject.push(bridge.stamp(MsgKind::DiskEject).get());
    }

    assert_eq!(insert, vec![0, 1, 1, 2]);
    assert_eq!(eject, vec![0, 0, 1, 1]);
}

#[test]
fn unknown_kind_changes_no_count() {
    let (bridge, _) = make_bridge();
    bridge.on_event(MsgKind::PowerOn.raw(), 0, 0, 0, 0);
    let before = bridge.channels().stamps();

    bridge.on_event(9999, 1, 2, 0, 0);

    assert_eq!(bridge.channels().stamps(), before);
    let status = bridge.status().current();
    assert_eq!(status.code, StatusCode::UnknownKind);
    assert!(status.message.contains("9999"), "{}", status.message);
}

#[test]
fn nested_run_waits_for_every_power_on_subscriber() {
    let (bridge, engine) = make_bridge();
    let log = journal();
    let run_stamp_seen = Arc::new(Mutex::new(Vec::new()));

    let weak = bridge.downgrade();
    let nested_engine = Arc::clone(&engine);
    let seen = Arc::clone(&run_stamp_seen);
    let _trigger = bridge.subscribe(MsgKind::PowerOn, move |note| {
        if note.stamp == Stamp::ZERO {
            return;
        }
        if let Some(bridge) = weak.upgrade() {
            nested_engine.emit(&bridge, RawEvent::of(MsgKind::Run, &[]));
            seen.lock().push(bridge.stamp(MsgKind::Run));
        }
    });
    let _tail = record(&bridge, MsgKind::PowerOn, &log);
    let _run = record(&bridge, MsgKind::Run, &log);

    engine.emit(&bridge, RawEvent::of(MsgKind::PowerOn, &[]));

    assert_eq!(kinds(&log), vec![MsgKind::PowerOn, MsgKind::Run]);
    // The nested emit returned before Run's channel moved.
    assert_eq!(*run_stamp_seen.lock(), vec![Stamp::ZERO]);
    assert_eq!(bridge.stamp(MsgKind::Run), Stamp::new(1));

    let machine = bridge.mirrors().machine().snapshot().unwrap();
    assert!(machine.powered_on && machine.running);
}

#[test]
fn subscriber_attached_mid_dispatch_sees_queued_event() {
    let (bridge, _) = make_bridge();
    let stamps = Arc::new(Mutex::new(Vec::new()));
    let held: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));

    let weak = bridge.downgrade();
    let sink = Arc::clone(&stamps);
    let keep = Arc::clone(&held);
    let _on_power = bridge.subscribe(MsgKind::PowerOn, move |note| {
        if note.stamp == Stamp::ZERO {
            return;
        }
        let Some(bridge) = weak.upgrade() else {
            return;
        };
        let sink = Arc::clone(&sink);
        let late = bridge.subscribe(MsgKind::Run, move |note| sink.lock().push(note.stamp));
        keep.lock().push(late);
        bridge.dispatch(RawEvent::of(MsgKind::Run, &[]));
    });

    bridge.on_event(MsgKind::PowerOn.raw(), 0, 0, 0, 0);

    assert_eq!(*stamps.lock(), vec![Stamp::ZERO, Stamp::new(1)]);
}

#[test]
fn failure_in_one_event_does_not_block_later_ones() {
    let (bridge, engine) = make_bridge_with(BridgeConfig {
        eager_refresh: true,
        ..BridgeConfig::default()
    })
    .unwrap();
    let log = journal();
    let _a = record(&bridge, MsgKind::DriveStep, &log);
    let _b = record(&bridge, MsgKind::SrvSend, &log);

    bridge.on_event(-7, 0, 0, 0, 0);
    bridge.dispatch(RawEvent::new(MsgKind::SrvSend.raw()));
    engine.set_offline(true);
    bridge.on_event(MsgKind::Reset.raw(), 0, 0, 0, 0);
    bridge.on_event(MsgKind::DriveStep.raw(), 0, 79, 0, 0);

    assert_eq!(kinds(&log), vec![MsgKind::SrvSend, MsgKind::DriveStep]);
    assert_eq!(bridge.stats().dispatched, 3);
    assert!(bridge.mirrors().machine().is_stale());
}

proptest! {
    #[test]
    fn nested_dispatch_preserves_global_fifo(
        outer in proptest::collection::vec(0usize..4, 1..16),
        fanout in 0usize..3,
    ) {
        const POOL: [MsgKind; 4] = [
            MsgKind::DriveRead,
            MsgKind::DriveWrite,
            MsgKind::HdrRead,
            MsgKind::SerOut,
        ];
        let (bridge, _) = make_bridge();
        let log = journal();
        let _subs: Vec<_> = POOL.iter().map(|kind| record(&bridge, *kind, &log)).collect();

        // Every DriveRead enqueues `fanout` SerOut events from inside its callback.
        let weak = bridge.downgrade();
        let _echo = bridge.subscribe(MsgKind::DriveRead, move |note| {
            if note.stamp == Stamp::ZERO {
                return;
            }
            for _ in 0..fanout {
                weak.dispatch(RawEvent::of(MsgKind::SerOut, &[0]));
            }
        });

        let mut expected = Vec::new();
        let mut pending = std::collections::VecDeque::new();
        for idx in &outer {
            let kind = POOL[*idx];
            bridge.dispatch(RawEvent::of(kind, &[0]));
            pending.push_back(kind);
            while let Some(kind) = pending.pop_front() {
                expected.push(kind);
                if kind == MsgKind::DriveRead {
                    pending.extend(std::iter::repeat(MsgKind::SerOut).take(fanout));
                }
            }
        }

        prop_assert_eq!(kinds(&log), expected);
    }
}
