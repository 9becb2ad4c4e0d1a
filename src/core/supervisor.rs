//! # Supervisor: the per-instance process lifecycle.
//!
//! One [`Supervisor`] owns exactly one child process, one output reader, and
//! one input writer; none of these are ever shared across instances.
//!
//! ## State machine
//! ```text
//! Stopped ──start()──► Provisioning ──provision ok──► spawn ──► Running
//!    ▲                      │                           │
//!    │                      └── provision/spawn failed ─┘ (error to caller)
//!    │
//!    └───────────── child exit observed (any cause) ◄─── Running
//! ```
//!
//! `Running` holds the command channel and the cancellation token for the
//! reader and tick tasks in one struct, so the process handle and the line
//! reader are created and destroyed together; `is_running` is true exactly
//! while that struct exists.
//!
//! ## Wiring on spawn
//! ```text
//!                   ┌── stdout ──► reader task ──► Line events ──► scanner ──► player events
//! child process ────┤                │
//!                   ├── stderr ──► reader task ──► Line events       (all onto the Bus,
//!                   └── stdin  ◄── writer task ◄── mpsc queue ◄── exec()   strict order)
//! ```
//!
//! The writer task is the only owner of the child's stdin, and commands
//! reach it through a bounded queue, so no two `exec` calls can interleave
//! their bytes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::command::{Command, LINE_ENDING};
use crate::config::ServerConfig;
use crate::core::buffer::LogBuffer;
use crate::core::{launch, ticker};
use crate::error::SupervisorError;
use crate::events::{Bus, Event, EventKind, LineSource};
use crate::provision::Provisioner;
use crate::scanner::{self, LineEvent};
use crate::subscribers::{Subscribe, SubscriberSet};

const BUS_CAPACITY: usize = 1024;
const COMMAND_QUEUE: usize = 64;

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Stopped,
    Provisioning,
    Running,
}

/// State held only while the child is alive. Dropping it closes the command
/// queue (ending the writer task) and the token cancels the reader and tick
/// tasks.
struct Running {
    cmd_tx: mpsc::Sender<String>,
    cancel: CancellationToken,
}

enum ProcState {
    Stopped,
    Provisioning,
    Running(Running),
}

struct Inner {
    cfg: ServerConfig,
    server: Arc<str>,
    provisioner: Provisioner,
    bus: Bus,
    buffer: LogBuffer,
    state: RwLock<ProcState>,
    ticks: AtomicU64,
}

/// Supervises one server process: provisioning, launch, output scraping,
/// command relay, and exit handling.
///
/// Cheap to clone; clones share the same instance.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Supervisor {
    /// Creates a supervisor for `cfg` with the given event subscribers and
    /// the default provisioner.
    ///
    /// Must be called within a tokio runtime (subscriber workers are spawned
    /// immediately).
    pub fn new(cfg: ServerConfig, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self::with_provisioner(cfg, subscribers, Provisioner::default())
    }

    /// Creates a supervisor with an explicit provisioner (used when the
    /// cache root differs from the default).
    pub fn with_provisioner(
        cfg: ServerConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
        provisioner: Provisioner,
    ) -> Self {
        let bus = Bus::new(BUS_CAPACITY);
        let server: Arc<str> = Arc::from(cfg.name.as_str());

        let sup = Self {
            inner: Arc::new(Inner {
                cfg,
                server,
                provisioner,
                bus,
                buffer: LogBuffer::default(),
                state: RwLock::new(ProcState::Stopped),
                ticks: AtomicU64::new(0),
            }),
        };
        sup.spawn_subscriber_listener(subscribers);
        sup
    }

    /// Forwards bus events to the subscriber fan-out (fire-and-forget).
    fn spawn_subscriber_listener(&self, subscribers: Vec<Arc<dyn Subscribe>>) {
        if subscribers.is_empty() {
            return;
        }
        let set = SubscriberSet::new(subscribers);
        let mut rx = self.inner.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit_arc(Arc::new(ev)),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Instance name (also the working-directory name).
    pub fn name(&self) -> &str {
        &self.inner.cfg.name
    }

    /// Configured artifact version.
    pub fn version(&self) -> &str {
        &self.inner.cfg.version
    }

    /// The instance configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ProcessState {
        match &*self.inner.state.read().await {
            ProcState::Stopped => ProcessState::Stopped,
            ProcState::Provisioning => ProcessState::Provisioning,
            ProcState::Running(_) => ProcessState::Running,
        }
    }

    /// True exactly while the child handle and line reader are live; false
    /// at all other times, including during provisioning.
    pub async fn is_running(&self) -> bool {
        matches!(&*self.inner.state.read().await, ProcState::Running(_))
    }

    /// Subscribes to this instance's event bus.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Snapshot of recently buffered console lines with their event
    /// sequence numbers, oldest first. Pair with [`Supervisor::subscribe`]
    /// (subscribe first, snapshot second) to replay and then tail without
    /// gaps.
    pub async fn buffered_lines(&self) -> Vec<(u64, String)> {
        self.inner.buffer.snapshot().await
    }

    /// Provisions the artifact and launches the child process.
    ///
    /// Returns [`SupervisorError::AlreadyRunning`] (non-fatal) unless the
    /// instance is Stopped. On provisioning or spawn failure the instance
    /// returns to Stopped and no process exists. On success the instance is
    /// Running and events begin to flow.
    pub async fn start(&self) -> Result<(), SupervisorError> {
        {
            let mut state = self.inner.state.write().await;
            if !matches!(*state, ProcState::Stopped) {
                return Err(SupervisorError::AlreadyRunning);
            }
            *state = ProcState::Provisioning;
        }

        let cfg = &self.inner.cfg;
        let work_dir = std::path::Path::new(&cfg.name);
        if let Err(e) = self
            .inner
            .provisioner
            .ensure_artifact(&cfg.version, work_dir, &cfg.options.jar)
            .await
        {
            *self.inner.state.write().await = ProcState::Stopped;
            return Err(e.into());
        }

        info!(server = %self.inner.server, "starting server");
        let spawned = match launch::spawn_server(cfg) {
            Ok(spawned) => spawned,
            Err(e) => {
                *self.inner.state.write().await = ProcState::Stopped;
                return Err(SupervisorError::Spawn(e));
            }
        };

        let cancel = CancellationToken::new();
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);

        self.spawn_writer(spawned.stdin, cmd_rx);
        self.spawn_reader(spawned.stdout, LineSource::Stdout, cancel.child_token());
        self.spawn_reader(spawned.stderr, LineSource::Stderr, cancel.child_token());

        // Transition before the exit watcher exists: the watcher is the only
        // task that tears Running down, so it must never observe the window
        // where the child is live but the state is not yet Running.
        self.inner.ticks.store(0, Ordering::Relaxed);
        {
            let mut state = self.inner.state.write().await;
            *state = ProcState::Running(Running {
                cmd_tx,
                cancel: cancel.clone(),
            });
            self.publish(EventKind::Started);
        }
        self.spawn_exit_watcher(spawned.child);
        ticker::spawn(self.clone(), cancel.child_token());
        Ok(())
    }

    /// Requests a graceful shutdown by sending the `stop` command.
    ///
    /// No-op unless Running. Termination is observed asynchronously through
    /// the exit watcher; there is no forced kill and no timeout escalation.
    pub async fn stop(&self) {
        if !self.is_running().await {
            return;
        }
        info!(server = %self.inner.server, "stopping server");
        self.exec("stop").await;
    }

    /// Renders `command` and relays it to the child's input stream.
    ///
    /// Silently ignored unless Running. Publishes an exec event carrying the
    /// rendered line and the structured command before the write is queued.
    pub async fn exec(&self, command: impl Into<Command>) {
        let command = command.into();

        let cmd_tx = {
            let state = self.inner.state.read().await;
            match &*state {
                ProcState::Running(running) => running.cmd_tx.clone(),
                _ => return,
            }
        };

        let raw = command.render();
        self.publish(EventKind::Exec {
            raw: raw.clone(),
            command,
        });
        // The writer appends the line terminator; a send failure means the
        // process died in the meantime and is absorbed as a no-op.
        let _ = cmd_tx.send(raw).await;
    }

    pub(crate) fn publish(&self, kind: EventKind) {
        self.inner
            .bus
            .publish(Event::new(self.inner.server.clone(), kind));
    }

    pub(crate) fn next_tick(&self) -> u64 {
        self.inner.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Single owner of the child's stdin: drains the command queue and
    /// writes one terminated line per command, strictly in queue order.
    fn spawn_writer(
        &self,
        mut stdin: tokio::process::ChildStdin,
        mut cmd_rx: mpsc::Receiver<String>,
    ) {
        let server = self.inner.server.clone();
        tokio::spawn(async move {
            while let Some(line) = cmd_rx.recv().await {
                let write = async {
                    stdin.write_all(line.as_bytes()).await?;
                    stdin.write_all(LINE_ENDING.as_bytes()).await?;
                    stdin.flush().await
                };
                if let Err(e) = write.await {
                    warn!(server = %server, error = %e, "input stream write failed");
                    break;
                }
            }
        });
    }

    /// Consumes one output stream line by line, in order: buffers the line,
    /// publishes it, and publishes any player events the scanner extracts.
    fn spawn_reader(
        &self,
        stream: impl AsyncRead + Unpin + Send + 'static,
        source: LineSource,
        cancel: CancellationToken,
    ) {
        let sup = self.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = lines.next_line() => match next {
                        Ok(Some(line)) => sup.ingest_line(source, line).await,
                        Ok(None) | Err(_) => break,
                    },
                }
            }
        });
    }

    async fn ingest_line(&self, source: LineSource, line: String) {
        info!(server = %self.inner.server, "{line}");

        let event = Event::new(
            self.inner.server.clone(),
            EventKind::Line {
                source,
                line: line.clone(),
            },
        );
        // Buffer before publish so replay-then-tail consumers never miss a
        // line between snapshot and subscription.
        self.inner.buffer.push(event.seq, &line).await;
        self.inner.bus.publish(event);

        if source == LineSource::Stdout {
            for extracted in scanner::scan(&line) {
                match extracted {
                    LineEvent::Join(join) => self.publish(EventKind::PlayerJoined(join)),
                    LineEvent::Leave(leave) => self.publish(EventKind::PlayerLeft(leave)),
                }
            }
        }
    }

    /// Waits for the child to terminate, then tears down the running state
    /// and publishes the stopped notification. Graceful stops and crashes
    /// are handled identically; the exit code is attached when available.
    fn spawn_exit_watcher(&self, mut child: Child) {
        let sup = self.clone();
        tokio::spawn(async move {
            let exit = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(server = %sup.inner.server, error = %e, "waiting on child failed");
                    None
                }
            };

            let prev = {
                let mut state = sup.inner.state.write().await;
                std::mem::replace(&mut *state, ProcState::Stopped)
            };
            if let ProcState::Running(running) = prev {
                running.cancel.cancel();
            }

            info!(server = %sup.inner.server, exit = ?exit, "server stopped");
            sup.publish(EventKind::Stopped { exit });
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn test_config(dir: &std::path::Path) -> ServerConfig {
        let mut cfg = ServerConfig::new(dir.to_string_lossy(), "custom");
        // `cat` rejects the fixed argument vector and exits at once,
        // giving a short-lived child without a JVM.
        cfg.options.java = "cat".to_string();
        cfg
    }

    async fn wait_until_stopped(sup: &Supervisor) {
        for _ in 0..100 {
            if !sup.is_running().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("instance did not stop");
    }

    #[tokio::test]
    async fn lifecycle_start_to_exit() {
        let root = tempfile::tempdir().expect("tempdir");
        let work = root.path().join("srv");
        let sup = Supervisor::with_provisioner(
            test_config(&work),
            Vec::new(),
            Provisioner::new(root.path().join("versions")),
        );
        let mut rx = sup.subscribe();

        assert_eq!(sup.state().await, ProcessState::Stopped);
        sup.start().await.expect("start succeeds");

        // Started is published on the transition to Running. Stderr lines
        // from the short-lived child may arrive around it.
        loop {
            let ev = rx.recv().await.expect("started event");
            match ev.kind {
                EventKind::Started => break,
                EventKind::Line { .. } => continue,
                other => panic!("unexpected event before start: {other:?}"),
            }
        }

        wait_until_stopped(&sup).await;
        assert_eq!(sup.state().await, ProcessState::Stopped);

        // The stopped notification follows, whatever the exit cause.
        loop {
            let ev = rx.recv().await.expect("stopped event");
            if matches!(ev.kind, EventKind::Stopped { .. }) {
                break;
            }
        }
    }

    #[tokio::test]
    async fn start_twice_reports_already_running() {
        let root = tempfile::tempdir().expect("tempdir");
        let work = root.path().join("srv");
        let sup = Supervisor::with_provisioner(
            test_config(&work),
            Vec::new(),
            Provisioner::new(root.path().join("versions")),
        );

        sup.start().await.expect("first start succeeds");
        match sup.start().await {
            Err(SupervisorError::AlreadyRunning) => {}
            // The short-lived child may already have exited, in which case a
            // restart is legitimate and must succeed.
            other => assert!(other.is_ok(), "unexpected error: {other:?}"),
        }
        wait_until_stopped(&sup).await;
    }

    #[tokio::test]
    async fn restart_after_exit_is_allowed() {
        let root = tempfile::tempdir().expect("tempdir");
        let work = root.path().join("srv");
        let sup = Supervisor::with_provisioner(
            test_config(&work),
            Vec::new(),
            Provisioner::new(root.path().join("versions")),
        );

        sup.start().await.expect("first start");
        wait_until_stopped(&sup).await;
        sup.start().await.expect("second start");
        wait_until_stopped(&sup).await;
    }

    #[tokio::test]
    async fn spawn_failure_returns_to_stopped() {
        let root = tempfile::tempdir().expect("tempdir");
        let work = root.path().join("srv");
        let mut cfg = test_config(&work);
        cfg.options.java = root
            .path()
            .join("no-such-binary")
            .to_string_lossy()
            .into_owned();

        let sup = Supervisor::with_provisioner(
            cfg,
            Vec::new(),
            Provisioner::new(root.path().join("versions")),
        );
        let err = sup.start().await.expect_err("spawn must fail");
        assert!(matches!(err, SupervisorError::Spawn(_)));
        assert_eq!(sup.state().await, ProcessState::Stopped);
        assert!(!sup.is_running().await);
    }

    #[tokio::test]
    async fn stop_while_stopped_is_silent() {
        let root = tempfile::tempdir().expect("tempdir");
        let work = root.path().join("srv");
        let sup = Supervisor::with_provisioner(
            test_config(&work),
            Vec::new(),
            Provisioner::new(root.path().join("versions")),
        );
        let mut rx = sup.subscribe();

        sup.stop().await;
        sup.exec("say hello").await;

        // Nothing may have been published.
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }
}
