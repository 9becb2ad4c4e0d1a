//! # Core subscriber trait.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations may be
/// slow (I/O, batching) without affecting the publisher or other
/// subscribers, but should prefer async I/O over blocking the runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name for logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue. On overflow, events for this
    /// subscriber are dropped with a warning.
    fn queue_capacity(&self) -> usize {
        256
    }
}
