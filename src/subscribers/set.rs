//! # Non-blocking event fan-out to multiple subscribers.
//!
//! [`SubscriberSet`] distributes events to its subscribers concurrently
//! without blocking the publisher.
//!
//! ## Rules
//! - **Per-subscriber FIFO**: each subscriber sees events in order.
//! - **No cross-subscriber ordering**: one subscriber may lag behind another.
//! - **Overflow**: a full queue drops the event for that subscriber only,
//!   with a warning.
//! - **Isolation**: a panicking subscriber is caught and reported; its
//!   worker keeps processing and other subscribers are unaffected.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::warn;

use crate::events::Event;
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator: one bounded queue and one worker task per
/// subscriber.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker task per subscriber.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

            tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        let info = panic_message(&panic_err);
                        warn!(subscriber = sub.name(), panic = %info, "subscriber panicked");
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
        }
        Self { channels }
    }

    /// Emits an event to every subscriber without awaiting any of them.
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a pre-allocated event. Preferred on hot paths (no clone).
    pub fn emit_arc(&self, event: Arc<Event>) {
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = channel.name, "subscriber queue full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(subscriber = channel.name, "subscriber queue closed, event dropped");
                }
            }
        }
    }
}

fn panic_message(panic_err: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic_err.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
