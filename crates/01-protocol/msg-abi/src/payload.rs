//! Raw callback records and typed payload extraction.

use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

use crate::error::{MsgError, MsgResult};
use crate::kind::MsgKind;

/// Argument layout the engine attaches to a message kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ArgShape {
    /// No payload; only the occurrence matters.
    None,
    /// One integer (drive number, address, exit code, ...).
    Int,
    /// Two integers (unit and cylinder, server and state, ...).
    Pair,
    /// Four integers, e.g. a viewport rectangle.
    Quad,
}

impl ArgShape {
    /// Minimum number of integer arguments this shape consumes.
    pub fn arity(self) -> usize {
        match self {
            ArgShape::None => 0,
            ArgShape::Int => 1,
            ArgShape::Pair => 2,
            ArgShape::Quad => 4,
        }
    }

    /// Validates `raw` against this shape and builds the typed payload.
    ///
    /// Extra trailing arguments are ignored; the engine pads every callback to
    /// four data words.
    pub fn extract(self, kind: MsgKind, raw: &RawEvent) -> MsgResult<Option<Payload>> {
        let args = raw.args.as_slice();
        let malformed = || MsgError::MalformedArgs {
            kind,
            expected: self,
            found: args.len(),
        };
        match self {
            ArgShape::None => Ok(None),
            ArgShape::Int => match args {
                [a, ..] => Ok(Some(Payload::Int(*a))),
                _ => Err(malformed()),
            },
            ArgShape::Pair => match args {
                [a, b, ..] => Ok(Some(Payload::Pair(*a, *b))),
                _ => Err(malformed()),
            },
            ArgShape::Quad => match args {
                [a, b, c, d, ..] => Ok(Some(Payload::Quad([*a, *b, *c, *d]))),
                _ => Err(malformed()),
            },
        }
    }
}

impl fmt::Display for ArgShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArgShape::None => "none",
            ArgShape::Int => "int",
            ArgShape::Pair => "pair",
            ArgShape::Quad => "quad",
        };
        f.write_str(label)
    }
}

/// Typed payload captured as a channel's last value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Int(i64),
    Pair(i64, i64),
    Quad([i64; 4]),
}

impl Payload {
    /// First integer of the payload.
    pub fn primary(&self) -> i64 {
        match self {
            Payload::Int(a) | Payload::Pair(a, _) => *a,
            Payload::Quad(words) => words[0],
        }
    }
}

/// Record handed over by the engine callback, before resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEvent {
    /// Raw message tag.
    pub id: i64,
    /// Integer arguments in emission order.
    pub args: SmallVec<[i64; 4]>,
}

impl RawEvent {
    /// Event without arguments.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            args: SmallVec::new(),
        }
    }

    /// Event with an explicit argument list.
    pub fn with_args(id: i64, args: &[i64]) -> Self {
        Self {
            id,
            args: SmallVec::from_slice(args),
        }
    }

    /// Record for the engine's `on_event(kind, d1, d2, d3, d4)` callback,
    /// which always carries four data words.
    pub fn from_callback(id: i64, data: [i64; 4]) -> Self {
        Self {
            id,
            args: SmallVec::from_buf(data),
        }
    }

    /// Builds an event for a known kind.
    pub fn of(kind: MsgKind, args: &[i64]) -> Self {
        Self::with_args(kind.raw(), args)
    }
}
