use bridge::{BridgeConfig, MsgKind, RawEvent};
use mock_engine::{make_bridge, make_bridge_with};
use pretty_assertions::assert_eq;
use proxy_mirror::{ConfigOption, VideoFormat};

use crate::support::init_logging;

#[test]
fn one_refresh_per_invalidation() {
    init_logging();
    let (bridge, engine) = make_bridge();
    let machine = bridge.mirrors().machine();

    machine.get(|m| m.running).unwrap();
    assert_eq!(engine.queries().machine, 1);

    engine.emit(&bridge, RawEvent::of(MsgKind::Run, &[]));
    assert!(machine.get(|m| m.running).unwrap());
    assert_eq!(engine.queries().machine, 2);

    assert!(machine.get(|m| m.running).unwrap());
    assert_eq!(engine.queries().machine, 2);
}

#[test]
fn unrelated_kinds_leave_mirrors_fresh() {
    let (bridge, engine) = make_bridge();
    bridge.mirrors().memory().snapshot().unwrap();
    bridge.mirrors().chipset().snapshot().unwrap();
    let before = engine.queries();

    for kind in [MsgKind::DriveMotorOn, MsgKind::SerOut, MsgKind::DiskInsert] {
        engine.emit(&bridge, RawEvent::of(kind, &[0]));
    }
    bridge.mirrors().memory().snapshot().unwrap();
    bridge.mirrors().chipset().snapshot().unwrap();

    assert_eq!(engine.queries(), before);
}

#[test]
fn repeated_invalidation_still_costs_one_fetch() {
    let (bridge, engine) = make_bridge();
    for _ in 0..3 {
        engine.emit(&bridge, RawEvent::of(MsgKind::WarpOn, &[]));
    }
    assert!(bridge.mirrors().machine().get(|m| m.warping).unwrap());
    assert_eq!(engine.queries().machine, 1);
}

#[test]
fn config_mirror_tracks_units_and_overclocking() {
    let (bridge, engine) = make_bridge();
    let config = bridge.mirrors().config();
    assert_eq!(config.unit_option(ConfigOption::DRIVE_CONNECT, 1).unwrap(), Some(0));
    assert_eq!(config.option(ConfigOption::CHIP_RAM).unwrap(), Some(512));

    engine.emit(&bridge, RawEvent::of(MsgKind::DriveConnect, &[1]));
    engine.emit(&bridge, RawEvent::of(MsgKind::Overclocking, &[3]));

    assert_eq!(config.unit_option(ConfigOption::DRIVE_CONNECT, 1).unwrap(), Some(1));
    assert_eq!(config.option(ConfigOption::CPU_OVERCLOCKING).unwrap(), Some(3));
    assert_eq!(engine.queries().config, 2);
}

#[test]
fn chipset_and_memory_fields() {
    let (bridge, engine) = make_bridge();
    engine.emit(&bridge, RawEvent::of(MsgKind::VideoFormat, &[1]));
    assert_eq!(
        bridge.mirrors().chipset().get(|c| c.video_format).unwrap(),
        VideoFormat::Ntsc
    );

    engine.emit_with(&bridge, RawEvent::of(MsgKind::MemLayout, &[]), |state| {
        state.memory.has_ext = true;
        state.memory.fast_ram_kb = 8192;
    });
    let memory = bridge.mirrors().memory().snapshot().unwrap();
    assert!(memory.has_rom && memory.has_ext);
    assert_eq!(memory.fast_ram_kb, 8192);
}

#[test]
fn shell_transcript_follows_console_updates() {
    let (bridge, engine) = make_bridge();
    engine.print(&bridge, "vAmiga RetroShell\n");
    assert_eq!(
        bridge.mirrors().shell().get(|s| s.text.clone()).unwrap(),
        "vAmiga RetroShell\n"
    );

    engine.emit(&bridge, RawEvent::of(MsgKind::CloseConsole, &[]));
    assert_eq!(bridge.mirrors().shell().get(|s| s.text.len()).unwrap(), 0);
}

#[test]
fn eager_refresh_reads_engine_during_dispatch() {
    let (bridge, engine) = make_bridge_with(BridgeConfig {
        eager_refresh: true,
        ..BridgeConfig::default()
    })
    .unwrap();

    engine.emit(&bridge, RawEvent::of(MsgKind::DmaDebugOn, &[]));
    assert_eq!(engine.queries().chipset, 1);
    assert!(bridge.mirrors().chipset().get(|c| c.dma_debug).unwrap());
    assert_eq!(engine.queries().chipset, 1);
}

#[test]
fn mirror_read_from_subscriber_sees_post_event_state() {
    let (bridge, engine) = make_bridge();
    bridge.mirrors().machine().snapshot().unwrap();

    let observed = std::sync::Arc::new(parking_lot::Mutex::new(None));
    let sink = std::sync::Arc::clone(&observed);
    let weak = bridge.downgrade();
    let _sub = bridge.subscribe(MsgKind::PowerOff, move |note| {
        if note.stamp.get() == 0 {
            return;
        }
        if let Some(bridge) = weak.upgrade() {
            *sink.lock() = bridge.mirrors().machine().get(|m| m.powered_on).ok();
        }
    });

    engine.emit(&bridge, RawEvent::of(MsgKind::PowerOn, &[]));
    engine.emit(&bridge, RawEvent::of(MsgKind::PowerOff, &[]));

    assert_eq!(*observed.lock(), Some(false));
}
