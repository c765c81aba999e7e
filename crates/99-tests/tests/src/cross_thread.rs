use std::sync::Arc;
use std::thread;

use bridge::{MsgKind, RawEvent};
use engine_link::LinkError;
use mock_engine::make_bridge;
use pretty_assertions::assert_eq;

use crate::support::{init_logging, journal, kinds, record};

const EVENTS: usize = 2_000;

fn script() -> Vec<RawEvent> {
    let cycle = [
        RawEvent::of(MsgKind::DriveMotorOn, &[0]),
        RawEvent::of(MsgKind::DriveStep, &[0, 40]),
        RawEvent::of(MsgKind::DriveRead, &[0]),
        RawEvent::of(MsgKind::DriveMotorOff, &[0]),
        RawEvent::of(MsgKind::Run, &[]),
    ];
    cycle.iter().cycle().take(EVENTS).cloned().collect()
}

#[test]
fn posted_events_arrive_in_order_after_pump() {
    init_logging();
    let (bridge, engine) = make_bridge();
    let log = journal();
    let _subs: Vec<_> = [
        MsgKind::DriveMotorOn,
        MsgKind::DriveStep,
        MsgKind::DriveRead,
        MsgKind::DriveMotorOff,
        MsgKind::Run,
    ]
    .into_iter()
    .map(|kind| record(&bridge, kind, &log))
    .collect();

    let events = script();
    let expected: Vec<_> = events
        .iter()
        .map(|event| MsgKind::from_raw(event.id).unwrap())
        .collect();

    let link = bridge.link();
    let poster_engine = Arc::clone(&engine);
    let poster = thread::spawn(move || {
        for event in events {
            poster_engine.apply_effect(&event);
            link.post(event).unwrap();
        }
    });

    let mut delivered = 0;
    while delivered < EVENTS {
        let pumped = bridge.pump_budget(64);
        assert!(pumped <= 64);
        delivered += pumped;
        if pumped == 0 {
            thread::yield_now();
        }
    }
    poster.join().unwrap();

    assert_eq!(kinds(&log), expected);
    assert_eq!(bridge.stamp(MsgKind::Run).get(), (EVENTS / 5) as u32);
    assert!(bridge.mirrors().machine().get(|m| m.running).unwrap());
    assert_eq!(bridge.pending(), 0);
}

#[test]
fn posting_after_bridge_drop_reports_closed() {
    let (bridge, _) = make_bridge();
    let link = bridge.link();
    drop(bridge);
    assert_eq!(link.on_event(MsgKind::Run.raw(), 0, 0, 0, 0), Err(LinkError::Closed));
}

#[test]
fn direct_dispatch_from_many_threads_loses_nothing() {
    let (bridge, _) = make_bridge();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let bridge = bridge.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    bridge.on_event(MsgKind::SerIn.raw(), 0x20, 0, 0, 0);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(bridge.stamp(MsgKind::SerIn).get(), 1_000);
    assert_eq!(bridge.stats().dispatched, 1_000);
}
