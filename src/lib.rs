//! # mcvisor
//!
//! **mcvisor** supervises Minecraft server child processes: it provisions
//! the versioned server artifact, launches the process with fixed runtime
//! tuning flags, scrapes its console output for domain events, and relays
//! text commands back into its input stream.
//!
//! ## Architecture
//! ```text
//!   ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//!   │  Supervisor  │      │  Supervisor  │      │  Supervisor  │
//!   │  (instance)  │      │  (instance)  │      │  (instance)  │
//!   └──────┬───────┘      └──────┬───────┘      └──────┬───────┘
//!          │ owns                │                     │
//!   ┌──────┴────────────────────┴─────────────────────┴───────┐
//!   │ per instance:                                            │
//!   │   Provisioner ─► child process ─► reader ─► scanner      │
//!   │   exec() ─► command queue ─► writer ─► child stdin       │
//!   │   tick clock, log buffer                                 │
//!   │   Bus (broadcast) ─► SubscriberSet ─► LogWriter, ...     │
//!   └──────────────────────────────────────────────────────────┘
//!          ▲                                            ▲
//!   ┌──────┴───────┐                            ┌───────┴──────┐
//!   │   Registry   │                            │  Status API  │
//!   │ (manager.json│                            │ /servers     │
//!   │  + shutdown  │                            │ /stream      │
//!   │  sweep)      │                            └──────────────┘
//!   └──────────────┘
//! ```
//!
//! ## Lifecycle
//! ```text
//! Stopped ──start()──► Provisioning ──► spawn ──► Running ──exit──► Stopped
//! ```
//! `start` runs the provisioning pipeline (cached download, artifact copy,
//! acceptance file), spawns the child with the fixed argument vector, and
//! wires the reader, writer, tick clock, and exit watcher. `stop` relays the
//! in-band `stop` command and lets the exit watcher observe termination.
//!
//! ## Events
//! Everything observable is published as an [`Event`] on the instance bus:
//! lifecycle transitions, console lines, extracted player joins and leaves,
//! relayed commands, and heartbeat ticks. Consumers either take a raw
//! [`Bus`] receiver or implement [`Subscribe`] for queued fan-out delivery.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use mcvisor::{LogWriter, ServerConfig, Subscribe, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = ServerConfig::new("lobby", "1.10.2");
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
//!     let server = Supervisor::new(cfg, subs);
//!
//!     server.start().await?;
//!     server.exec("say hello from mcvisor").await;
//!     server.stop().await;
//!     Ok(())
//! }
//! ```

pub mod api;
mod command;
mod config;
mod core;
mod error;
mod events;
mod provision;
mod registry;
pub mod scanner;
mod subscribers;

pub use crate::command::{Command, LINE_ENDING};
pub use crate::config::{ServerConfig, ServerOptions, CUSTOM_VERSION};
pub use crate::core::shutdown::wait_for_shutdown_signal;
pub use crate::core::{ProcessState, Supervisor};
pub use crate::error::{ProvisionError, RegistryError, SupervisorError};
pub use crate::events::{Bus, Event, EventKind, LineSource};
pub use crate::provision::Provisioner;
pub use crate::registry::{ManagerConfig, Registry};
pub use crate::scanner::{LineEvent, PlayerJoin, PlayerLeave};
pub use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};
