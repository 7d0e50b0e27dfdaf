//! # Shared Bus - Kernel Event Bus
//!
//! Observers learn about kernel state changes only through this bus.
//!
//! ## Rules
//!
//! - Services publish **after** a change commits but **before** they release
//!   the store's write lock, so a subsystem's events arrive in commit order.
//!   A rejected call publishes nothing.
//! - One event per state change, carrying the same data as the call.
//! - Delivery is best-effort broadcast: slow subscribers lose the oldest
//!   events rather than blocking publishers.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐  subscribe()  ┌──────────┐
//! │  Subsystem   │ ────────────► │  Event Bus   │ ────────────► │ Observer │
//! └──────────────┘               └──────────────┘               └──────────┘
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{subsystem_ids, EventFilter, EventTopic, KernelEvent};
pub use publisher::{BusStats, EventPublisher, InMemoryEventBus, NullPublisher};
pub use subscriber::{BusError, EventStream, Subscription};

/// Maximum events buffered per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
