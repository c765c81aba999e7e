//! Line-oriented event traces.
//!
//! One event per line: a kind (symbolic key or numeric tag) followed by up to
//! four data words in decimal or `0x` hex. Missing words are zero, as in the
//! engine callback. Blank lines are skipped and `#` starts a comment.
//!
//! ```text
//! # boot
//! POWER_ON
//! DISK_INSERT 0        # df0
//! VIEWPORT 0x81 0x2c 0x1c1 0x12c
//! 9999
//! ```

use anyhow::{anyhow, bail, Context, Result};
use msg_abi::{MsgKind, RawEvent};

/// Parses a whole trace, reporting the first bad line by number.
pub fn parse(input: &str) -> Result<Vec<RawEvent>> {
    let mut events = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let parsed = parse_line(line).with_context(|| format!("line {}: {line:?}", idx + 1))?;
        events.extend(parsed);
    }
    Ok(events)
}

/// Parses one line; `None` for blanks and comments.
pub fn parse_line(line: &str) -> Result<Option<RawEvent>> {
    let content = match line.find('#') {
        Some(start) => &line[..start],
        None => line,
    };
    let mut tokens = content.split_whitespace();
    let Some(head) = tokens.next() else {
        return Ok(None);
    };
    let id = match parse_int(head) {
        Some(raw) => raw,
        None => MsgKind::from_key(head)?.raw(),
    };

    let mut data = [0i64; 4];
    for (idx, token) in tokens.enumerate() {
        let word = parse_int(token).ok_or_else(|| anyhow!("invalid argument '{token}'"))?;
        match data.get_mut(idx) {
            Some(slot) => *slot = word,
            None => bail!("at most four data words per event"),
        }
    }
    Ok(Some(RawEvent::from_callback(id, data)))
}

fn parse_int(token: &str) -> Option<i64> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) if hex.starts_with(|c: char| c.is_ascii_hexdigit()) => {
            i64::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -value } else { value })
}
