//! Runtime core: process lifecycle and supervision.
//!
//! Internal modules:
//! - [`supervisor`]: the Stopped/Provisioning/Running state machine, command
//!   channel, and exit handling;
//! - [`launch`]: fixed argument vector and child spawning;
//! - [`ticker`]: the periodic heartbeat while running;
//! - [`buffer`]: capped ring of recent console lines for replay;
//! - [`shutdown`]: cross-platform termination-signal helper.

mod buffer;
mod launch;
pub mod shutdown;
mod supervisor;
mod ticker;

pub use supervisor::{ProcessState, Supervisor};
