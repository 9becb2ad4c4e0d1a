//! # Console line scanner.
//!
//! Pure pattern matching over single lines of server console output. The
//! scanner holds no state and performs no I/O, so the grammar can be tested
//! (and fuzzed) without a live process.
//!
//! ## Grammar
//! Two fixed patterns, each anchored at the end of the line. Every line is
//! tested against both patterns independently; a line can in principle yield
//! more than one event.
//!
//! **Join** (emitted when a player connects):
//! ```text
//! <username> [<address>] logged in with entity id <digits> at (<x>, <y>, <z>)
//! ```
//! The bracketed address is optional. Coordinates are captured as the exact
//! text the server printed; they are never parsed into floats here.
//!
//! **Leave** (emitted when a player disconnects):
//! ```text
//! <username> lost connection: <reason>
//! ```
//! The reason is free text and is kept verbatim.

use std::sync::OnceLock;

use regex::Regex;

const JOIN_PATTERN: &str =
    r"(\w+) ?(?:\[/?(.+)\] )?logged in with entity id (\d+) at \((-?[\d.]+), (-?[\d.]+), (-?[\d.]+)\)$";
const LEAVE_PATTERN: &str = r"(\w+) lost connection: (.+)$";

fn join_regex() -> &'static Regex {
    static JOIN: OnceLock<Regex> = OnceLock::new();
    JOIN.get_or_init(|| Regex::new(JOIN_PATTERN).expect("join pattern is valid"))
}

fn leave_regex() -> &'static Regex {
    static LEAVE: OnceLock<Regex> = OnceLock::new();
    LEAVE.get_or_init(|| Regex::new(LEAVE_PATTERN).expect("leave pattern is valid"))
}

/// A player joined the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerJoin {
    pub username: String,
    /// Remote address as printed by the server, without the brackets or the
    /// leading slash. Absent for integrated or offline connections.
    pub address: Option<String>,
    pub entity_id: String,
    /// Spawn coordinates `[x, y, z]`, kept as the captured text.
    pub coordinates: [String; 3],
}

/// A player left the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLeave {
    pub username: String,
    /// Trailing reason text, verbatim.
    pub reason: String,
}

/// Domain event extracted from one console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Join(PlayerJoin),
    Leave(PlayerLeave),
}

/// Extracts every domain event present in `line`.
///
/// Lines matching neither pattern yield an empty vec and are not an error.
pub fn scan(line: &str) -> Vec<LineEvent> {
    let mut events = Vec::new();

    if let Some(caps) = join_regex().captures(line) {
        events.push(LineEvent::Join(PlayerJoin {
            username: caps[1].to_string(),
            address: caps.get(2).map(|m| m.as_str().to_string()),
            entity_id: caps[3].to_string(),
            coordinates: [
                caps[4].to_string(),
                caps[5].to_string(),
                caps[6].to_string(),
            ],
        }));
    }

    if let Some(caps) = leave_regex().captures(line) {
        events.push(LineEvent::Leave(PlayerLeave {
            username: caps[1].to_string(),
            reason: caps[2].to_string(),
        }));
    }

    events
}
