//! # Domain Layer
//!
//! Queues, their events and the selection rule. Pure and synchronous; the
//! current time is always passed in.

pub mod entities;
pub mod queue;
pub mod store;

pub use entities::{NextEvent, QueueInfo, QueuedEvent};
pub use queue::Queue;
pub use store::{QueueStore, SYSTEM_QUEUE_ID};
