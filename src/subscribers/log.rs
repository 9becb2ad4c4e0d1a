//! # Logging subscriber.
//!
//! [`LogWriter`] renders instance events through `tracing`. It is the
//! reference [`Subscribe`] implementation and the default observer wired up
//! by the registry.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Structured-logging subscriber.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let server = e.server.as_ref();
        match &e.kind {
            EventKind::Started => {
                info!(server, "server started");
            }
            EventKind::Stopped { exit } => {
                info!(server, exit = ?exit, "server stopped");
            }
            EventKind::Tick { count } => {
                debug!(server, count, "tick");
            }
            EventKind::Exec { raw, .. } => {
                info!(server, "<< {raw}");
            }
            // Console lines are already passed through by the reader task.
            EventKind::Line { .. } => {}
            EventKind::PlayerJoined(join) => {
                info!(
                    server,
                    username = %join.username,
                    entity_id = %join.entity_id,
                    address = ?join.address,
                    "player joined"
                );
            }
            EventKind::PlayerLeft(leave) => {
                info!(
                    server,
                    username = %leave.username,
                    reason = %leave.reason,
                    "player left"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
