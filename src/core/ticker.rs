//! Periodic heartbeat while an instance is running.
//!
//! Fires on a fixed period, incrementing the per-instance counter and
//! publishing a tick event with the new value. The loop exits when the exit
//! watcher cancels its token, and additionally self-terminates the first
//! time it observes the supervisor no longer running, so a missed cleanup
//! cannot leave a timer behind.

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::Supervisor;
use crate::events::EventKind;

pub(crate) const TICK_PERIOD: Duration = Duration::from_millis(500);

/// Spawns the tick loop for a running instance.
pub(crate) fn spawn(supervisor: Supervisor, cancel: CancellationToken) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = time::sleep(TICK_PERIOD) => {}
            }

            if !supervisor.is_running().await {
                break;
            }

            let count = supervisor.next_tick();
            supervisor.publish(EventKind::Tick { count });
        }
    });
}
