//! In-memory engine backend for driving a bridge without an emulator.
//!
//! [`MockEngine::emit`] mutates the mock state the way the real engine
//! would before calling back, then dispatches the event, so mirrors read
//! after a notification observe the post-event state.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bridge::{Bridge, BridgeConfig, BridgeResult};
use log::trace;
use msg_abi::{MsgKind, Payload, RawEvent};
use parking_lot::Mutex;
use proxy_mirror::{
    ChipsetSnapshot, ConfigKey, ConfigOption, ConfigSnapshot, EngineQuery, MachineSnapshot,
    MemorySnapshot, QueryError, QueryResult, ShellSnapshot, VideoFormat, Viewport,
};

/// Creates a bridge over a fresh mock engine with default configuration.
pub fn make_bridge() -> (Bridge, Arc<MockEngine>) {
    let engine = Arc::new(MockEngine::new());
    let bridge = Bridge::new(engine.clone());
    (bridge, engine)
}

pub fn make_bridge_with(config: BridgeConfig) -> BridgeResult<(Bridge, Arc<MockEngine>)> {
    let engine = Arc::new(MockEngine::new());
    let bridge = Bridge::builder()
        .engine(engine.clone())
        .config(config)
        .build()?;
    Ok((bridge, engine))
}

/// Everything the mock answers queries from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineState {
    pub config: ConfigSnapshot,
    pub machine: MachineSnapshot,
    pub chipset: ChipsetSnapshot,
    pub memory: MemorySnapshot,
    pub shell: ShellSnapshot,
}

impl EngineState {
    /// A stock 512K machine with one drive attached and a ROM installed.
    pub fn stock() -> Self {
        let config = ConfigSnapshot::from_items([
            (ConfigKey::global(ConfigOption::VIDEO_FORMAT), 0),
            (ConfigKey::global(ConfigOption::CHIP_RAM), 512),
            (ConfigKey::global(ConfigOption::SLOW_RAM), 0),
            (ConfigKey::global(ConfigOption::FAST_RAM), 0),
            (ConfigKey::global(ConfigOption::CPU_OVERCLOCKING), 0),
            (ConfigKey::unit(ConfigOption::DRIVE_CONNECT, 0), 1),
            (ConfigKey::unit(ConfigOption::DRIVE_CONNECT, 1), 0),
        ]);
        Self {
            config,
            memory: MemorySnapshot {
                has_rom: true,
                has_ext: false,
                rom_fingerprint: 0x9ed7_83d0,
                chip_ram_kb: 512,
                slow_ram_kb: 0,
                fast_ram_kb: 0,
            },
            ..Self::default()
        }
    }

    /// State change the engine performs before reporting `kind`.
    fn apply(&mut self, kind: MsgKind, value: Option<&Payload>) {
        let word = value.map(Payload::primary);
        let unit = word.and_then(|w| u16::try_from(w).ok());
        match kind {
            MsgKind::PowerOn => self.machine.powered_on = true,
            MsgKind::PowerOff => {
                self.machine.powered_on = false;
                self.machine.running = false;
            }
            MsgKind::Run => self.machine.running = true,
            MsgKind::Pause | MsgKind::Halt | MsgKind::Reset => self.machine.running = false,
            MsgKind::WarpOn => self.machine.warping = true,
            MsgKind::WarpOff => self.machine.warping = false,
            MsgKind::DebugOn => self.machine.debugging = true,
            MsgKind::DebugOff => self.machine.debugging = false,
            MsgKind::MuteOn => self.machine.muted = true,
            MsgKind::MuteOff => self.machine.muted = false,
            MsgKind::Overclocking => {
                if let Some(factor) = word {
                    self.config
                        .set(ConfigKey::global(ConfigOption::CPU_OVERCLOCKING), factor);
                }
            }
            MsgKind::DriveConnect | MsgKind::DriveDisconnect => {
                if let Some(unit) = unit {
                    let connected = i64::from(kind == MsgKind::DriveConnect);
                    self.config
                        .set(ConfigKey::unit(ConfigOption::DRIVE_CONNECT, unit), connected);
                }
            }
            MsgKind::HdcConnect | MsgKind::HdcDisconnect => {
                if let Some(unit) = unit {
                    let connected = i64::from(kind == MsgKind::HdcConnect);
                    self.config
                        .set(ConfigKey::unit(ConfigOption::HDC_CONNECT, unit), connected);
                }
            }
            MsgKind::VideoFormat => {
                if let Some(format) = word.and_then(VideoFormat::from_raw) {
                    self.chipset.video_format = format;
                }
            }
            MsgKind::Viewport => {
                if let Some(Payload::Quad(words)) = value {
                    self.chipset.viewport = Viewport::from_words(*words);
                }
            }
            MsgKind::DmaDebugOn => self.chipset.dma_debug = true,
            MsgKind::DmaDebugOff => self.chipset.dma_debug = false,
            MsgKind::CloseConsole => {
                self.shell.text.clear();
                self.shell.cursor_rel = 0;
            }
            _ => {}
        }
    }
}

/// Per-aggregate count of engine queries served.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryCounts {
    pub config: usize,
    pub machine: usize,
    pub chipset: usize,
    pub memory: usize,
    pub shell: usize,
}

impl QueryCounts {
    pub fn total(&self) -> usize {
        self.config + self.machine + self.chipset + self.memory + self.shell
    }
}

#[derive(Debug, Default)]
struct Counters {
    config: AtomicUsize,
    machine: AtomicUsize,
    chipset: AtomicUsize,
    memory: AtomicUsize,
    shell: AtomicUsize,
}

#[derive(Debug, Default)]
pub struct MockEngine {
    state: Mutex<EngineState>,
    counters: Counters,
    offline: AtomicBool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::with_state(EngineState::stock())
    }

    pub fn with_state(state: EngineState) -> Self {
        Self {
            state: Mutex::new(state),
            ..Self::default()
        }
    }

    pub fn state(&self) -> EngineState {
        self.state.lock().clone()
    }

    /// Mutates the state without notifying anyone.
    pub fn update(&self, edit: impl FnOnce(&mut EngineState)) {
        edit(&mut *self.state.lock());
    }

    /// While offline every query fails with [`QueryError::NotReady`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn queries(&self) -> QueryCounts {
        QueryCounts {
            config: self.counters.config.load(Ordering::SeqCst),
            machine: self.counters.machine.load(Ordering::SeqCst),
            chipset: self.counters.chipset.load(Ordering::SeqCst),
            memory: self.counters.memory.load(Ordering::SeqCst),
            shell: self.counters.shell.load(Ordering::SeqCst),
        }
    }

    /// Applies the event's state effect, then hands it to the bridge.
    pub fn emit(&self, bridge: &Bridge, raw: RawEvent) {
        self.apply_effect(&raw);
        bridge.dispatch(raw);
    }

    /// Runs `edit` against the state, then emits `raw`.
    pub fn emit_with(
        &self,
        bridge: &Bridge,
        raw: RawEvent,
        edit: impl FnOnce(&mut EngineState),
    ) {
        self.update(edit);
        self.emit(bridge, raw);
    }

    /// Appends console output and reports it.
    pub fn print(&self, bridge: &Bridge, text: &str) {
        self.emit_with(bridge, RawEvent::of(MsgKind::UpdateConsole, &[]), |state| {
            state.shell.text.push_str(text);
        });
    }

    /// Performs the state change the engine makes before reporting `raw`.
    /// Engine threads posting through a link call this before each post.
    pub fn apply_effect(&self, raw: &RawEvent) {
        let Ok(kind) = MsgKind::from_raw(raw.id) else {
            return;
        };
        let value = kind.shape().extract(kind, raw).ok().flatten();
        trace!("mock engine applying {kind}");
        self.state.lock().apply(kind, value.as_ref());
    }

    fn serve<T>(
        &self,
        counter: &AtomicUsize,
        read: impl FnOnce(&EngineState) -> T,
    ) -> QueryResult<T> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(QueryError::NotReady);
        }
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(read(&*self.state.lock()))
    }
}

impl EngineQuery for MockEngine {
    fn config(&self) -> QueryResult<ConfigSnapshot> {
        self.serve(&self.counters.config, |state| state.config.clone())
    }

    fn machine(&self) -> QueryResult<MachineSnapshot> {
        self.serve(&self.counters.machine, |state| state.machine.clone())
    }

    fn chipset(&self) -> QueryResult<ChipsetSnapshot> {
        self.serve(&self.counters.chipset, |state| state.chipset.clone())
    }

    fn memory(&self) -> QueryResult<MemorySnapshot> {
        self.serve(&self.counters.memory, |state| state.memory.clone())
    }

    fn shell(&self) -> QueryResult<ShellSnapshot> {
        self.serve(&self.counters.shell, |state| state.shell.clone())
    }
}
