use std::fmt;

use serde::Serialize;

/// Code held by the status surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// No outstanding condition.
    #[default]
    Ok,
    /// The engine emitted a tag outside the catalog.
    UnknownKind,
    /// A stateful kind arrived without its expected payload.
    MalformedArgs,
    /// The engine signalled an unrecoverable condition.
    EngineFatal,
}

impl StatusCode {
    /// Symbolic key, e.g. `UNKNOWN_KIND`.
    pub fn key(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::UnknownKind => "UNKNOWN_KIND",
            StatusCode::MalformedArgs => "MALFORMED_ARGS",
            StatusCode::EngineFatal => "ENGINE_FATAL",
        }
    }

    /// Only fatal codes are meant to be surfaced prominently.
    pub fn is_fatal(self) -> bool {
        self == StatusCode::EngineFatal
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
