//! # Event type and classification.
//!
//! An [`Event`] pairs a monotonic sequence number and timestamp with the
//! originating instance name and an [`EventKind`]. Sequence numbers are
//! global and strictly increasing, so subscribers that buffer or merge
//! streams can restore exact publish order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::command::Command;
use crate::scanner::{PlayerJoin, PlayerLeave};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Which output stream a console line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSource {
    Stdout,
    Stderr,
}

/// Classification of instance events, with per-kind payloads.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// The child process was spawned and wired up.
    Started,

    /// The child process terminated, for any reason. Graceful stops and
    /// crashes both surface here; `exit` carries the exit code when the
    /// platform reported one.
    Stopped { exit: Option<i32> },

    /// Periodic heartbeat while the instance is running.
    Tick { count: u64 },

    /// A command was relayed to the child's input stream. Carries both the
    /// rendered line (without terminator) and the structured original, for
    /// audit consumers.
    Exec { raw: String, command: Command },

    /// One line of child console output, in arrival order.
    Line { source: LineSource, line: String },

    /// A player joined, extracted from the console output.
    PlayerJoined(PlayerJoin),

    /// A player left, extracted from the console output.
    PlayerLeft(PlayerLeave),
}

/// An instance event.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Name of the originating instance.
    pub server: Arc<str>,
    /// Event classification and payload.
    pub kind: EventKind,
}

impl Event {
    /// Creates an event with the current timestamp and next sequence number.
    pub fn new(server: Arc<str>, kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, Ordering::Relaxed),
            at: SystemTime::now(),
            server,
            kind,
        }
    }

    /// True for console-line events.
    pub fn is_line(&self) -> bool {
        matches!(self.kind, EventKind::Line { .. })
    }
}
