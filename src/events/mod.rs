//! # Runtime events published by supervised instances.
//!
//! Every notable occurrence in an instance's life is published as an
//! [`Event`] on that instance's [`Bus`]: lifecycle transitions, console
//! output lines, extracted player events, relayed commands, and heartbeat
//! ticks. Components never inherit broadcast behavior; anything interested
//! subscribes explicitly, either with [`Bus::subscribe`] or through the
//! [`Subscribe`](crate::Subscribe) fan-out.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, LineSource};
