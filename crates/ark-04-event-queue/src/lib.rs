//! # ARK-04 Event Queue Manager
//!
//! **Subsystem ID:** 4
//!
//! ## Purpose
//!
//! Bounded FIFO-ish queues of typed events with an owner, a set of
//! authorized processors and a processing timeout after which a stuck event
//! can be handed out again.
//!
//! ## Queues
//!
//! | Queue | Created by | Deletable |
//! |-------|------------|-----------|
//! | `0` (system) | the service, at construction | never |
//! | `1..` | `create_queue`, owned by the caller | by the owner |
//!
//! Queue ids are never reused. Event ids are allocated per queue starting at
//! `0` and are never reused either, even after the event leaves the queue.
//!
//! ## Event Lifecycle
//!
//! ```text
//! enqueue ──► [pending] ──dequeue──► [processing] ──mark_processed──► removed
//!                 ▲                        │
//!                 └────────release─────────┤
//!                                          │ timeout elapsed
//!                                          └──dequeue──► [processing] (reclaimed)
//! ```
//!
//! Selection hands out the first pending event in storage order. Only when
//! no event is pending is the stale processing event with the oldest start
//! reclaimed. Processed events are removed by swap-with-last, so storage
//! order is not enqueue order once anything has been processed.
//!
//! ## Authorization
//!
//! | Operation | Caller |
//! |-----------|--------|
//! | enqueue | anyone, unless the queue is paused |
//! | dequeue / mark processed / release | owner or authorized processor |
//! | pause / resume / configure / processors / delete | owner |

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::{Queue, QueueInfo, QueueStore, QueuedEvent, SYSTEM_QUEUE_ID};
    pub use crate::errors::QueueError;
    pub use crate::ports::EventQueueApi;
    pub use crate::service::{create_test_service, EventQueueService, ServiceConfig};
}

pub use domain::{QueueInfo, QueuedEvent, SYSTEM_QUEUE_ID};
pub use errors::QueueError;
pub use ports::EventQueueApi;
pub use service::{EventQueueService, ServiceConfig, ServiceStats};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = shared_bus::subsystem_ids::EVENT_QUEUE;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Event Queue Manager";
