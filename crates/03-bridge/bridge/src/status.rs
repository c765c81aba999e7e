//! Last-error surface exported to the presentation layer.
//!
//! Only the most recent condition is kept. Each report also advances a
//! wrapping revision so that two identical reports in a row remain
//! distinguishable to change-detecting observers.

use std::sync::atomic::{AtomicU32, Ordering};

use event_channel::Stamp;
use msg_abi::StatusCode;
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    pub code: StatusCode,
    /// Error code supplied by the engine, for fatal conditions.
    pub engine_code: Option<i64>,
    pub message: String,
}

impl Status {
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }
}

#[derive(Debug, Default)]
pub struct StatusSurface {
    current: Mutex<Status>,
    revision: AtomicU32,
}

impl StatusSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the pair.
    pub fn report(&self, code: StatusCode, message: impl Into<String>) {
        self.store(Status {
            code,
            engine_code: None,
            message: message.into(),
        });
    }

    /// Like [`report`](Self::report), but leaves an outstanding engine-fatal
    /// condition in place. Returns whether the pair was written.
    pub fn report_unless_fatal(&self, code: StatusCode, message: impl Into<String>) -> bool {
        let mut current = self.current.lock();
        if current.code.is_fatal() {
            return false;
        }
        *current = Status {
            code,
            engine_code: None,
            message: message.into(),
        };
        self.revision.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Overwrites the pair with an engine-fatal condition.
    pub fn report_fatal(&self, engine_code: Option<i64>, message: impl Into<String>) {
        self.store(Status {
            code: StatusCode::EngineFatal,
            engine_code,
            message: message.into(),
        });
    }

    /// Resets to the no-error sentinel.
    pub fn clear(&self) {
        self.store(Status::default());
    }

    pub fn current(&self) -> Status {
        self.current.lock().clone()
    }

    pub fn code(&self) -> StatusCode {
        self.current.lock().code
    }

    /// Advances on every report or clear.
    pub fn revision(&self) -> Stamp {
        Stamp::new(self.revision.load(Ordering::Acquire))
    }

    fn store(&self, status: Status) {
        *self.current.lock() = status;
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}
