//! Error types used by the supervisor runtime.
//!
//! Three enums, one per failure domain:
//!
//! - [`ProvisionError`] — the artifact or acceptance file could not be put in
//!   place; fatal to that start attempt.
//! - [`SupervisorError`] — errors surfaced by [`Supervisor::start`](crate::Supervisor::start).
//! - [`RegistryError`] — persisted server-list failures and shutdown sweeps
//!   that did not settle.
//!
//! Not-running conditions are deliberately absent: `stop` and `exec` on a
//! stopped instance are silent no-ops, not errors.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while ensuring the artifact and acceptance file exist.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Network fetch of the versioned artifact failed.
    #[error("artifact download failed: {0}")]
    Download(#[from] reqwest::Error),

    /// Cache or working-directory filesystem operation failed.
    #[error("provisioning filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced to the caller of `start`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The instance is not Stopped; reported, not fatal, and `start` is a
    /// no-op.
    #[error("server already started")]
    AlreadyRunning,

    /// Provisioning failed before spawn; no process was created.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// The child process could not be spawned.
    #[error("failed to spawn server process: {0}")]
    Spawn(#[source] std::io::Error),
}

impl SupervisorError {
    /// Short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::AlreadyRunning => "already_running",
            SupervisorError::Provision(_) => "provision_failed",
            SupervisorError::Spawn(_) => "spawn_failed",
        }
    }
}

/// Errors raised by the server registry.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The persisted server list exists but does not parse. Fatal at process
    /// startup; the registry never silently falls back to defaults.
    #[error("corrupt server list {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the persisted server list failed.
    #[error("server list i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The shutdown sweep did not settle within the grace period.
    #[error("shutdown grace {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        grace: Duration,
        stuck: Vec<String>,
    },
}
