use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::trace;
use msg_abi::MsgKind;
use parking_lot::Mutex;
use thiserror::Error;

use crate::engine::{EngineQuery, QueryError};
use crate::snapshot::{ConfigOption, ConfigSnapshot, Snapshot};

pub type MirrorResult<T> = Result<T, MirrorError>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MirrorError {
    #[error("{mirror} mirror refresh failed: {source}")]
    Refresh {
        mirror: &'static str,
        #[source]
        source: QueryError,
    },
}

struct Cached<S> {
    snapshot: Option<Arc<S>>,
    /// Invalidation epoch the snapshot was fetched under.
    epoch: u64,
}

/// Lazily refreshed copy of one engine aggregate.
///
/// Staleness is tracked with an epoch counter: every invalidation bumps it,
/// and a cached snapshot is current only while its recorded epoch matches.
/// An invalidation that races with a refresh therefore forces another fetch
/// on the next read.
pub struct Mirror<S: Snapshot> {
    engine: Arc<dyn EngineQuery>,
    epoch: AtomicU64,
    version: AtomicU64,
    state: Mutex<Cached<S>>,
}

impl<S: Snapshot> Mirror<S> {
    pub fn new(engine: Arc<dyn EngineQuery>) -> Self {
        Self {
            engine,
            epoch: AtomicU64::new(0),
            version: AtomicU64::new(0),
            state: Mutex::new(Cached {
                snapshot: None,
                epoch: 0,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        S::NAME
    }

    pub fn invalidated_by(&self) -> &'static [MsgKind] {
        S::INVALIDATED_BY
    }

    pub fn is_invalidated_by(&self, kind: MsgKind) -> bool {
        S::INVALIDATED_BY.contains(&kind)
    }

    /// Marks the cached snapshot stale. The next read re-queries the engine.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_stale(&self) -> bool {
        let state = self.state.lock();
        state.snapshot.is_none() || state.epoch != self.epoch.load(Ordering::Acquire)
    }

    /// Number of successful refreshes so far; changes whenever the cached
    /// snapshot is replaced.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Current snapshot, re-querying the engine first if stale.
    pub fn snapshot(&self) -> MirrorResult<Arc<S>> {
        let mut state = self.state.lock();
        let epoch = self.epoch.load(Ordering::Acquire);
        if let Some(snapshot) = state.snapshot.as_ref() {
            if state.epoch == epoch {
                return Ok(Arc::clone(snapshot));
            }
        }
        self.fetch_into(&mut state, epoch)
    }

    /// Reads one field through the cache.
    pub fn get<R>(&self, field: impl FnOnce(&S) -> R) -> MirrorResult<R> {
        let snapshot = self.snapshot()?;
        Ok(field(&snapshot))
    }

    /// Re-queries the engine unconditionally.
    pub fn refresh(&self) -> MirrorResult<Arc<S>> {
        let mut state = self.state.lock();
        let epoch = self.epoch.load(Ordering::Acquire);
        self.fetch_into(&mut state, epoch)
    }

    /// Last fetched snapshot without refreshing, even if stale.
    pub fn cached(&self) -> Option<Arc<S>> {
        self.state.lock().snapshot.clone()
    }

    fn fetch_into(&self, state: &mut Cached<S>, epoch: u64) -> MirrorResult<Arc<S>> {
        let fresh = S::fetch(self.engine.as_ref()).map_err(|source| MirrorError::Refresh {
            mirror: S::NAME,
            source,
        })?;
        let fresh = Arc::new(fresh);
        state.snapshot = Some(Arc::clone(&fresh));
        state.epoch = epoch;
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        trace!("mirror {} refreshed: version={version} epoch={epoch}", S::NAME);
        Ok(fresh)
    }
}

impl Mirror<ConfigSnapshot> {
    /// Global value of a configuration option.
    pub fn option(&self, option: ConfigOption) -> MirrorResult<Option<i64>> {
        self.get(|config| config.get(option))
    }

    /// Per-unit value of a configuration option.
    pub fn unit_option(&self, option: ConfigOption, unit: u16) -> MirrorResult<Option<i64>> {
        self.get(|config| config.get_unit(option, unit))
    }
}

impl<S: Snapshot> fmt::Debug for Mirror<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror")
            .field("name", &S::NAME)
            .field("stale", &self.is_stale())
            .field("version", &self.version())
            .finish()
    }
}

/// Type-erased control surface the router uses to invalidate mirrors.
pub trait MirrorControl: Send + Sync {
    fn name(&self) -> &'static str;

    fn invalidated_by(&self) -> &'static [MsgKind];

    fn invalidate(&self);

    /// Refreshes right away, discarding the snapshot handle.
    fn refresh_now(&self) -> MirrorResult<()>;

    fn is_stale(&self) -> bool;

    fn version(&self) -> u64;
}

impl<S: Snapshot> MirrorControl for Mirror<S> {
    fn name(&self) -> &'static str {
        S::NAME
    }

    fn invalidated_by(&self) -> &'static [MsgKind] {
        S::INVALIDATED_BY
    }

    fn invalidate(&self) {
        Mirror::invalidate(self);
    }

    fn refresh_now(&self) -> MirrorResult<()> {
        self.refresh().map(|_| ())
    }

    fn is_stale(&self) -> bool {
        Mirror::is_stale(self)
    }

    fn version(&self) -> u64 {
        Mirror::version(self)
    }
}
