use std::fmt;
use std::sync::Arc;

use msg_abi::MsgKind;

use crate::engine::EngineQuery;
use crate::mirror::{Mirror, MirrorControl};
use crate::snapshot::{
    ChipsetSnapshot, ConfigSnapshot, MachineSnapshot, MemorySnapshot, ShellSnapshot,
};

/// The fixed set of mirrors kept by one bridge session.
pub struct Mirrors {
    config: Mirror<ConfigSnapshot>,
    machine: Mirror<MachineSnapshot>,
    chipset: Mirror<ChipsetSnapshot>,
    memory: Mirror<MemorySnapshot>,
    shell: Mirror<ShellSnapshot>,
}

impl Mirrors {
    /// One stale mirror per engine aggregate, all reading from `engine`.
    pub fn new(engine: Arc<dyn EngineQuery>) -> Self {
        Self {
            config: Mirror::new(Arc::clone(&engine)),
            machine: Mirror::new(Arc::clone(&engine)),
            chipset: Mirror::new(Arc::clone(&engine)),
            memory: Mirror::new(Arc::clone(&engine)),
            shell: Mirror::new(engine),
        }
    }

    pub fn config(&self) -> &Mirror<ConfigSnapshot> {
        &self.config
    }

    pub fn machine(&self) -> &Mirror<MachineSnapshot> {
        &self.machine
    }

    pub fn chipset(&self) -> &Mirror<ChipsetSnapshot> {
        &self.chipset
    }

    pub fn memory(&self) -> &Mirror<MemorySnapshot> {
        &self.memory
    }

    pub fn shell(&self) -> &Mirror<ShellSnapshot> {
        &self.shell
    }

    /// Every mirror behind its control surface, in a fixed order.
    pub fn all(&self) -> [&dyn MirrorControl; 5] {
        [
            &self.config,
            &self.machine,
            &self.chipset,
            &self.memory,
            &self.shell,
        ]
    }

    /// Mirrors whose invalidation set contains `kind`.
    pub fn affected_by(&self, kind: MsgKind) -> impl Iterator<Item = &dyn MirrorControl> {
        self.all()
            .into_iter()
            .filter(move |mirror| mirror.invalidated_by().contains(&kind))
    }

    /// Marks every mirror affected by `kind` stale and returns how many.
    pub fn invalidate_for(&self, kind: MsgKind) -> usize {
        let mut hit = 0;
        for mirror in self.affected_by(kind) {
            mirror.invalidate();
            hit += 1;
        }
        hit
    }

    pub fn invalidate_all(&self) {
        for mirror in self.all() {
            mirror.invalidate();
        }
    }
}

impl fmt::Debug for Mirrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.all().iter().map(|m| m.name())).finish()
    }
}
