//! Records inspector NDJSON across a short session and checks each line.

use bridge::{Bridge, MsgKind, RawEvent};
use mock_engine::{make_bridge, MockEngine};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn capture(bridge: &Bridge, engine: &MockEngine, event: RawEvent) -> String {
    engine.emit(bridge, event);
    bridge
        .inspect()
        .to_ndjson_line()
        .expect("serialize bridge vm")
}

fn record_session() -> Vec<String> {
    let (bridge, engine) = make_bridge();
    let script = [
        RawEvent::of(MsgKind::PowerOn, &[]),
        RawEvent::of(MsgKind::Viewport, &[0x81, 0x2c, 0x1c1, 0x12c]),
        RawEvent::from_callback(MsgKind::SrvReceive.raw(), [0x67, 0, 0, 0]),
        RawEvent::new(9999),
        RawEvent::of(MsgKind::Abort, &[1]),
    ];
    script
        .into_iter()
        .map(|event| capture(&bridge, &engine, event))
        .collect()
}

fn parse(line: &str) -> Value {
    assert!(line.ends_with('\n'));
    assert_eq!(line.matches('\n').count(), 1);
    serde_json::from_str(line).expect("valid json line")
}

#[test]
fn every_line_is_one_json_object() {
    let lines = record_session();
    assert_eq!(lines.len(), 5);
    for line in &lines {
        assert!(parse(line).is_object());
    }
}

#[test]
fn channels_accumulate_with_payloads() {
    let lines = record_session();

    let first = parse(&lines[0]);
    assert_eq!(
        first["channels"],
        json!([{ "kind": "POWER_ON", "group": "lifecycle", "count": 1, "subscribers": 0 }])
    );

    let third = parse(&lines[2]);
    let channels = third["channels"].as_array().unwrap();
    assert_eq!(channels.len(), 3);
    assert_eq!(channels[1]["value"], json!([0x81, 0x2c, 0x1c1, 0x12c]));
    assert_eq!(channels[2]["kind"], "SRV_RECEIVE");
    assert_eq!(channels[2]["value"], 0x67);
}

#[test]
fn status_and_stats_follow_failures() {
    let lines = record_session();

    let unknown = parse(&lines[3]);
    assert_eq!(unknown["status"]["code"], "UNKNOWN_KIND");
    assert_eq!(unknown["stats"]["unknown"], 1);
    assert_eq!(unknown["stats"]["dispatched"], 3);

    let fatal = parse(&lines[4]);
    assert_eq!(
        fatal["status"],
        json!({ "code": "ENGINE_FATAL", "engine_code": 1, "message": "engine aborted with code 1" })
    );
    assert_eq!(fatal["stats"]["fatal"], 1);
}

#[test]
fn mirrors_report_staleness_after_power_on() {
    let lines = record_session();
    let first = parse(&lines[0]);
    let machine = first["mirrors"]
        .as_array()
        .unwrap()
        .iter()
        .find(|mirror| mirror["name"] == "machine")
        .cloned()
        .unwrap();
    assert_eq!(machine, json!({ "name": "machine", "stale": true, "version": 0 }));
}
