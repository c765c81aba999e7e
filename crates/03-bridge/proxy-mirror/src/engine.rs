use thiserror::Error;

use crate::snapshot::{
    ChipsetSnapshot, ConfigSnapshot, MachineSnapshot, MemorySnapshot, ShellSnapshot,
};

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("engine is not ready")]
    NotReady,

    #[error("engine query failed: {0}")]
    Failed(String),
}

impl QueryError {
    pub fn failed(msg: impl Into<String>) -> Self {
        QueryError::Failed(msg.into())
    }
}

/// Synchronous state queries the engine answers for mirror refreshes.
///
/// Implementations must be side-effect free and bounded; they run on the
/// presentation thread while the engine keeps stepping.
pub trait EngineQuery: Send + Sync {
    fn config(&self) -> QueryResult<ConfigSnapshot>;

    fn machine(&self) -> QueryResult<MachineSnapshot>;

    fn chipset(&self) -> QueryResult<ChipsetSnapshot>;

    fn memory(&self) -> QueryResult<MemorySnapshot>;

    fn shell(&self) -> QueryResult<ShellSnapshot>;
}
