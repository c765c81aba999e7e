use thiserror::Error;

use crate::kind::MsgKind;
use crate::payload::ArgShape;

pub type MsgResult<T> = Result<T, MsgError>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MsgError {
    #[error("unknown message kind {0}")]
    UnknownKind(i64),

    #[error("unknown message key '{0}'")]
    UnknownKey(String),

    #[error("malformed arguments for {kind}: expected {expected}, got {found} argument(s)")]
    MalformedArgs {
        kind: MsgKind,
        expected: ArgShape,
        found: usize,
    },
}
