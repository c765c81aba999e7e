//! Read-through mirrors of engine-owned aggregates.
//!
//! A mirror caches one snapshot of a backend subsystem and re-queries the
//! engine only after a message kind from its invalidation set has been
//! dispatched. The engine stays the source of truth; nothing is written back.

mod engine;
mod mirror;
mod set;
mod snapshot;

pub use engine::{EngineQuery, QueryError, QueryResult};
pub use mirror::{Mirror, MirrorControl, MirrorError, MirrorResult};
pub use set::Mirrors;
pub use snapshot::{
    ChipsetSnapshot, ConfigKey, ConfigOption, ConfigSnapshot, MachineSnapshot, MemorySnapshot,
    ShellSnapshot, Snapshot, VideoFormat, Viewport,
};
