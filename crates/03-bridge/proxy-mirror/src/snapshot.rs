//! Snapshot shapes for each mirrored aggregate and their invalidation sets.

use std::collections::BTreeMap;

use msg_abi::MsgKind;
use serde::Serialize;

use crate::engine::{EngineQuery, QueryResult};

/// A backend aggregate that can be mirrored.
pub trait Snapshot: Clone + Send + Sync + 'static {
    /// Short name used in logs and inspector output.
    const NAME: &'static str;

    /// Kinds whose occurrence makes a cached copy stale.
    const INVALIDATED_BY: &'static [MsgKind];

    /// Queries the engine for a full, current copy.
    fn fetch(engine: &dyn EngineQuery) -> QueryResult<Self>;
}

/// Engine configuration option identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConfigOption(pub u32);

impl ConfigOption {
    pub const VIDEO_FORMAT: ConfigOption = ConfigOption(0);
    pub const AGNUS_REVISION: ConfigOption = ConfigOption(3);
    pub const DENISE_REVISION: ConfigOption = ConfigOption(6);
    pub const DMA_DEBUG_ENABLE: ConfigOption = ConfigOption(12);
    pub const CPU_REVISION: ConfigOption = ConfigOption(17);
    pub const CPU_OVERCLOCKING: ConfigOption = ConfigOption(20);
    pub const CHIP_RAM: ConfigOption = ConfigOption(23);
    pub const SLOW_RAM: ConfigOption = ConfigOption(24);
    pub const FAST_RAM: ConfigOption = ConfigOption(25);
    pub const DRIVE_CONNECT: ConfigOption = ConfigOption(32);
    pub const DRIVE_TYPE: ConfigOption = ConfigOption(36);
    pub const HDC_CONNECT: ConfigOption = ConfigOption(45);
    pub const AUDVOL: ConfigOption = ConfigOption(72);
    pub const AUDVOLL: ConfigOption = ConfigOption(73);
    pub const AUDVOLR: ConfigOption = ConfigOption(74);
}

/// Option plus the unit (drive, controller, channel) it applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey {
    pub option: ConfigOption,
    pub unit: Option<u16>,
}

impl ConfigKey {
    pub fn global(option: ConfigOption) -> Self {
        Self { option, unit: None }
    }

    pub fn unit(option: ConfigOption, unit: u16) -> Self {
        Self {
            option,
            unit: Some(unit),
        }
    }
}

/// Full set of configuration items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    items: BTreeMap<ConfigKey, i64>,
}

impl ConfigSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = (ConfigKey, i64)>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: i64) {
        self.items.insert(key, value);
    }

    /// Global value of `option`.
    pub fn get(&self, option: ConfigOption) -> Option<i64> {
        self.items.get(&ConfigKey::global(option)).copied()
    }

    /// Per-unit value of `option`, e.g. a drive-specific setting.
    pub fn get_unit(&self, option: ConfigOption, unit: u16) -> Option<i64> {
        self.items.get(&ConfigKey::unit(option, unit)).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConfigKey, &i64)> {
        self.items.iter()
    }
}

impl Snapshot for ConfigSnapshot {
    const NAME: &'static str = "config";
    const INVALIDATED_BY: &'static [MsgKind] = &[
        MsgKind::Config,
        MsgKind::Overclocking,
        MsgKind::DriveConnect,
        MsgKind::DriveDisconnect,
        MsgKind::HdcConnect,
        MsgKind::HdcDisconnect,
    ];

    fn fetch(engine: &dyn EngineQuery) -> QueryResult<Self> {
        engine.config()
    }
}

/// Run state of the emulated machine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MachineSnapshot {
    pub powered_on: bool,
    pub running: bool,
    pub warping: bool,
    pub debugging: bool,
    pub muted: bool,
}

impl MachineSnapshot {
    /// Powered on but not running.
    pub fn is_paused(&self) -> bool {
        self.powered_on && !self.running
    }
}

impl Snapshot for MachineSnapshot {
    const NAME: &'static str = "machine";
    const INVALIDATED_BY: &'static [MsgKind] = &[
        MsgKind::PowerOn,
        MsgKind::PowerOff,
        MsgKind::Run,
        MsgKind::Pause,
        MsgKind::Step,
        MsgKind::Reset,
        MsgKind::Halt,
        MsgKind::WarpOn,
        MsgKind::WarpOff,
        MsgKind::DebugOn,
        MsgKind::DebugOff,
        MsgKind::MuteOn,
        MsgKind::MuteOff,
    ];

    fn fetch(engine: &dyn EngineQuery) -> QueryResult<Self> {
        engine.machine()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum VideoFormat {
    #[default]
    Pal,
    Ntsc,
}

impl VideoFormat {
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(VideoFormat::Pal),
            1 => Some(VideoFormat::Ntsc),
            _ => None,
        }
    }
}

/// Visible area in beam coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub hstrt: i64,
    pub vstrt: i64,
    pub hstop: i64,
    pub vstop: i64,
}

impl Viewport {
    pub fn from_words(words: [i64; 4]) -> Self {
        let [hstrt, vstrt, hstop, vstop] = words;
        Self {
            hstrt,
            vstrt,
            hstop,
            vstop,
        }
    }

    pub fn width(&self) -> i64 {
        (self.hstop - self.hstrt).max(0)
    }

    pub fn height(&self) -> i64 {
        (self.vstop - self.vstrt).max(0)
    }
}

/// Display chipset state relevant to the presentation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChipsetSnapshot {
    pub video_format: VideoFormat,
    pub viewport: Viewport,
    pub dma_debug: bool,
}

impl Snapshot for ChipsetSnapshot {
    const NAME: &'static str = "chipset";
    const INVALIDATED_BY: &'static [MsgKind] = &[
        MsgKind::VideoFormat,
        MsgKind::Viewport,
        MsgKind::DmaDebugOn,
        MsgKind::DmaDebugOff,
    ];

    fn fetch(engine: &dyn EngineQuery) -> QueryResult<Self> {
        engine.chipset()
    }
}

/// Installed ROMs and RAM sizes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemorySnapshot {
    pub has_rom: bool,
    pub has_ext: bool,
    pub rom_fingerprint: u32,
    pub chip_ram_kb: u32,
    pub slow_ram_kb: u32,
    pub fast_ram_kb: u32,
}

impl Snapshot for MemorySnapshot {
    const NAME: &'static str = "memory";
    const INVALIDATED_BY: &'static [MsgKind] = &[MsgKind::MemLayout];

    fn fetch(engine: &dyn EngineQuery) -> QueryResult<Self> {
        engine.memory()
    }
}

/// Debug shell transcript.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ShellSnapshot {
    pub text: String,
    /// Cursor position relative to the end of the input line.
    pub cursor_rel: i64,
}

impl Snapshot for ShellSnapshot {
    const NAME: &'static str = "shell";
    const INVALIDATED_BY: &'static [MsgKind] = &[
        MsgKind::UpdateConsole,
        MsgKind::CloseConsole,
        MsgKind::ScriptDone,
        MsgKind::ScriptAbort,
    ];

    fn fetch(engine: &dyn EngineQuery) -> QueryResult<Self> {
        engine.shell()
    }
}
