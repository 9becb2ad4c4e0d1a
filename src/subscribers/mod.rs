//! # Event subscribers.
//!
//! The [`Subscribe`] trait is the extension point for plugging event
//! consumers into an instance. Each subscriber is driven by a dedicated
//! worker loop fed from a bounded queue owned by the [`SubscriberSet`], so a
//! slow or panicking subscriber never blocks the publisher or its peers.
//!
//! ```text
//! reader / ticker / exec ── publish(Event) ──► Bus ──► fan-out listener
//!                                                           │
//!                                              ┌────────────┼────────────┐
//!                                              ▼            ▼            ▼
//!                                         [queue 1]    [queue 2]    [queue N]
//!                                          worker 1     worker 2     worker N
//!                                              │            │            │
//!                                         sub1.on_event  sub2.on_event  ...
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
