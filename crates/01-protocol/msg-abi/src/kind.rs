//! Closed message taxonomy.
//!
//! Identifiers are dense and start at zero so that a kind doubles as an index
//! into per-kind tables. Adding a kind is a protocol change; existing ids are
//! never reused for a different meaning.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{MsgError, MsgResult};
use crate::payload::ArgShape;

/// Subsystem a message kind belongs to. Metadata only; dispatch ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MsgGroup {
    /// Power, run state, warp/debug/mute toggles and the power LED.
    Lifecycle,
    /// Debug console and script execution.
    Console,
    /// Video format, viewport and DMA debugger overlay.
    Video,
    /// CPU and copper breakpoints, watchpoints and traps.
    Debugger,
    /// Memory map changes.
    Memory,
    /// Floppy drives and disks.
    FloppyDrive,
    /// Hard drive controllers and hard drives.
    HardDrive,
    /// Keyboard and mouse gestures detected by the engine.
    Input,
    /// Serial port traffic.
    Serial,
    /// Snapshot capture and restore.
    Snapshot,
    /// Screen recording.
    Recording,
    /// Remote debug server.
    Server,
}

impl MsgGroup {
    /// Every group in catalog order.
    pub const ALL: [MsgGroup; 12] = [
        MsgGroup::Lifecycle,
        MsgGroup::Console,
        MsgGroup::Video,
        MsgGroup::Debugger,
        MsgGroup::Memory,
        MsgGroup::FloppyDrive,
        MsgGroup::HardDrive,
        MsgGroup::Input,
        MsgGroup::Serial,
        MsgGroup::Snapshot,
        MsgGroup::Recording,
        MsgGroup::Server,
    ];

    /// Kinds belonging to this group, in id order.
    pub fn kinds(self) -> impl Iterator<Item = MsgKind> {
        MsgKind::ALL
            .iter()
            .copied()
            .filter(move |kind| kind.group() == self)
    }

    /// Lower-case name used by the CLI and inspector output.
    pub fn label(self) -> &'static str {
        match self {
            MsgGroup::Lifecycle => "lifecycle",
            MsgGroup::Console => "console",
            MsgGroup::Video => "video",
            MsgGroup::Debugger => "debugger",
            MsgGroup::Memory => "memory",
            MsgGroup::FloppyDrive => "floppy",
            MsgGroup::HardDrive => "hard-drive",
            MsgGroup::Input => "input",
            MsgGroup::Serial => "serial",
            MsgGroup::Snapshot => "snapshot",
            MsgGroup::Recording => "recording",
            MsgGroup::Server => "server",
        }
    }
}

impl fmt::Display for MsgGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl Serialize for MsgGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

macro_rules! msg_catalog {
    ($( $variant:ident = $id:literal => $key:literal, $group:ident, $shape:ident; )*) => {
        /// Message kind emitted by the engine.
        #[repr(u16)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum MsgKind {
            $( $variant = $id, )*
        }

        impl MsgKind {
            /// Every kind in id order.
            pub const ALL: &'static [MsgKind] = &[ $( MsgKind::$variant, )* ];

            /// Number of kinds in the catalog.
            pub const COUNT: usize = Self::ALL.len();

            /// Stable symbolic key, e.g. `DISK_INSERT`.
            pub fn key(self) -> &'static str {
                match self {
                    $( MsgKind::$variant => $key, )*
                }
            }

            /// Subsystem this kind belongs to.
            pub fn group(self) -> MsgGroup {
                match self {
                    $( MsgKind::$variant => MsgGroup::$group, )*
                }
            }

            /// Payload shape the engine attaches to this kind.
            pub fn shape(self) -> ArgShape {
                match self {
                    $( MsgKind::$variant => ArgShape::$shape, )*
                }
            }

            /// Resolves a raw engine tag.
            pub fn from_raw(raw: i64) -> MsgResult<Self> {
                match raw {
                    $( $id => Ok(MsgKind::$variant), )*
                    _ => Err(MsgError::UnknownKind(raw)),
                }
            }
        }
    };
}

msg_catalog! {
    None = 0 => "NONE", Lifecycle, None;
    Register = 1 => "REGISTER", Lifecycle, None;
    Config = 2 => "CONFIG", Lifecycle, None;
    PowerOn = 3 => "POWER_ON", Lifecycle, None;
    PowerOff = 4 => "POWER_OFF", Lifecycle, None;
    Run = 5 => "RUN", Lifecycle, None;
    Pause = 6 => "PAUSE", Lifecycle, None;
    Step = 7 => "STEP", Lifecycle, None;
    Reset = 8 => "RESET", Lifecycle, None;
    Halt = 9 => "HALT", Lifecycle, None;
    Abort = 10 => "ABORT", Lifecycle, Int;
    WarpOn = 11 => "WARP_ON", Lifecycle, None;
    WarpOff = 12 => "WARP_OFF", Lifecycle, None;
    DebugOn = 13 => "DEBUG_ON", Lifecycle, None;
    DebugOff = 14 => "DEBUG_OFF", Lifecycle, None;
    MuteOn = 15 => "MUTE_ON", Lifecycle, None;
    MuteOff = 16 => "MUTE_OFF", Lifecycle, None;
    PowerLedOn = 17 => "POWER_LED_ON", Lifecycle, None;
    PowerLedDim = 18 => "POWER_LED_DIM", Lifecycle, None;
    PowerLedOff = 19 => "POWER_LED_OFF", Lifecycle, None;
    CloseConsole = 20 => "CLOSE_CONSOLE", Console, None;
    UpdateConsole = 21 => "UPDATE_CONSOLE", Console, None;
    ScriptDone = 22 => "SCRIPT_DONE", Console, Int;
    ScriptPause = 23 => "SCRIPT_PAUSE", Console, Int;
    ScriptAbort = 24 => "SCRIPT_ABORT", Console, Int;
    ScriptWakeup = 25 => "SCRIPT_WAKEUP", Console, Int;
    VideoFormat = 26 => "VIDEO_FORMAT", Video, Int;
    Overclocking = 27 => "OVERCLOCKING", Lifecycle, Int;
    BreakpointReached = 28 => "BREAKPOINT_REACHED", Debugger, Int;
    BreakpointUpdated = 29 => "BREAKPOINT_UPDATED", Debugger, None;
    WatchpointReached = 30 => "WATCHPOINT_REACHED", Debugger, Int;
    WatchpointUpdated = 31 => "WATCHPOINT_UPDATED", Debugger, None;
    CatchpointReached = 32 => "CATCHPOINT_REACHED", Debugger, Int;
    CatchpointUpdated = 33 => "CATCHPOINT_UPDATED", Debugger, None;
    SwTrapReached = 34 => "SWTRAP_REACHED", Debugger, Int;
    CpuHalt = 35 => "CPU_HALT", Debugger, None;
    CopperBpReached = 36 => "COPPERBP_REACHED", Debugger, Int;
    CopperBpUpdated = 37 => "COPPERBP_UPDATED", Debugger, None;
    CopperWpReached = 38 => "COPPERWP_REACHED", Debugger, Int;
    CopperWpUpdated = 39 => "COPPERWP_UPDATED", Debugger, None;
    Viewport = 40 => "VIEWPORT", Video, Quad;
    MemLayout = 41 => "MEM_LAYOUT", Memory, None;
    DriveConnect = 42 => "DRIVE_CONNECT", FloppyDrive, Int;
    DriveDisconnect = 43 => "DRIVE_DISCONNECT", FloppyDrive, Int;
    DriveSelect = 44 => "DRIVE_SELECT", FloppyDrive, Int;
    DriveRead = 45 => "DRIVE_READ", FloppyDrive, Int;
    DriveWrite = 46 => "DRIVE_WRITE", FloppyDrive, Int;
    DriveLedOn = 47 => "DRIVE_LED_ON", FloppyDrive, Int;
    DriveLedOff = 48 => "DRIVE_LED_OFF", FloppyDrive, Int;
    DriveMotorOn = 49 => "DRIVE_MOTOR_ON", FloppyDrive, Int;
    DriveMotorOff = 50 => "DRIVE_MOTOR_OFF", FloppyDrive, Int;
    DriveStep = 51 => "DRIVE_STEP", FloppyDrive, Pair;
    DrivePoll = 52 => "DRIVE_POLL", FloppyDrive, Pair;
    DiskInsert = 53 => "DISK_INSERT", FloppyDrive, Int;
    DiskEject = 54 => "DISK_EJECT", FloppyDrive, Int;
    DiskSaved = 55 => "DISK_SAVED", FloppyDrive, Int;
    DiskUnsaved = 56 => "DISK_UNSAVED", FloppyDrive, Int;
    DiskProtect = 57 => "DISK_PROTECT", FloppyDrive, Int;
    DiskUnprotect = 58 => "DISK_UNPROTECT", FloppyDrive, Int;
    HdcConnect = 59 => "HDC_CONNECT", HardDrive, Int;
    HdcDisconnect = 60 => "HDC_DISCONNECT", HardDrive, Int;
    HdcState = 61 => "HDC_STATE", HardDrive, Pair;
    HdrStep = 62 => "HDR_STEP", HardDrive, Pair;
    HdrRead = 63 => "HDR_READ", HardDrive, Int;
    HdrWrite = 64 => "HDR_WRITE", HardDrive, Int;
    HdrIdle = 65 => "HDR_IDLE", HardDrive, Int;
    CtrlAmigaAmiga = 66 => "CTRL_AMIGA_AMIGA", Input, None;
    Shaking = 67 => "SHAKING", Input, None;
    SerIn = 68 => "SER_IN", Serial, Int;
    SerOut = 69 => "SER_OUT", Serial, Int;
    AutoSnapshotTaken = 70 => "AUTO_SNAPSHOT_TAKEN", Snapshot, None;
    UserSnapshotTaken = 71 => "USER_SNAPSHOT_TAKEN", Snapshot, None;
    SnapshotRestored = 72 => "SNAPSHOT_RESTORED", Snapshot, None;
    RecordingStarted = 73 => "RECORDING_STARTED", Recording, None;
    RecordingStopped = 74 => "RECORDING_STOPPED", Recording, None;
    RecordingAborted = 75 => "RECORDING_ABORTED", Recording, None;
    DmaDebugOn = 76 => "DMA_DEBUG_ON", Video, None;
    DmaDebugOff = 77 => "DMA_DEBUG_OFF", Video, None;
    SrvState = 78 => "SRV_STATE", Server, Pair;
    SrvReceive = 79 => "SRV_RECEIVE", Server, Int;
    SrvSend = 80 => "SRV_SEND", Server, Int;
}

impl MsgKind {
    /// Position of this kind in per-kind tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Raw tag as the engine emits it.
    #[inline]
    pub fn raw(self) -> i64 {
        self as i64
    }

    /// Kinds that signal an unrecoverable engine condition.
    pub fn is_fatal(self) -> bool {
        matches!(self, MsgKind::Abort | MsgKind::CpuHalt)
    }

    /// Whether occurrences carry a payload recorded as the channel's last value.
    pub fn is_stateful(self) -> bool {
        self.shape() != ArgShape::None
    }

    /// Resolves a symbolic key. Accepts an optional `MSG_` prefix and any case.
    pub fn from_key(key: &str) -> MsgResult<Self> {
        let trimmed = key.trim();
        let bare = trimmed
            .strip_prefix("MSG_")
            .or_else(|| trimmed.strip_prefix("msg_"))
            .unwrap_or(trimmed);
        MsgKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.key().eq_ignore_ascii_case(bare))
            .ok_or_else(|| MsgError::UnknownKey(key.to_string()))
    }
}

impl fmt::Display for MsgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

impl FromStr for MsgKind {
    type Err = MsgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MsgKind::from_key(s)
    }
}

impl TryFrom<i64> for MsgKind {
    type Error = MsgError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        MsgKind::from_raw(raw)
    }
}

impl Serialize for MsgKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}
