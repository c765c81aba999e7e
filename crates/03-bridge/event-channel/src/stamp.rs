use std::fmt;

use serde::Serialize;

/// Fixed-width occurrence counter value.
///
/// Comparisons go through wrapping subtraction so they stay correct after the
/// counter rolls over in long sessions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Stamp(u32);

impl Stamp {
    pub const ZERO: Stamp = Stamp(0);

    pub const fn new(raw: u32) -> Self {
        Stamp(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Stamp after one more occurrence.
    pub const fn next(self) -> Stamp {
        Stamp(self.0.wrapping_add(1))
    }

    /// Occurrences between `baseline` and `self`, modulo 2^32.
    pub const fn since(self, baseline: Stamp) -> u32 {
        self.0.wrapping_sub(baseline.0)
    }

    /// Whether anything fired after `baseline` was taken.
    pub const fn fired_since(self, baseline: Stamp) -> bool {
        self.since(baseline) != 0
    }

    /// Serial-number ordering: `self` is ahead of `other` by less than half
    /// the counter range.
    pub const fn is_newer_than(self, other: Stamp) -> bool {
        (self.0.wrapping_sub(other.0) as i32) > 0
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Stamp> for u32 {
    fn from(stamp: Stamp) -> Self {
        stamp.0
    }
}
