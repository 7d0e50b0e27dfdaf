//! # ARK-05 Event Subscription Manager
//!
//! **Subsystem ID:** 5
//!
//! ## Purpose
//!
//! Keeps a registry of event types and, per event type, the accounts that
//! want to be told when one occurs.
//!
//! ## Event Types
//!
//! An event type's id is `keccak256(name)`. It carries a description and a
//! subscriber cap (`0` is unlimited). Admins admitted for
//! `AdminScope::EventTypes` and members of the authorized caller set may
//! register event types, change caps and notify. Only admins manage the
//! authorized caller set.
//!
//! ## Subscription Lifecycle
//!
//! ```text
//!   (none) ──subscribe──► [active] ──pause──► [paused]
//!     ▲                     │  ▲                 │
//!     │                     │  └──resume/subscribe┘
//!     └─────unsubscribe─────┴─────unsubscribe─────┘
//! ```
//!
//! Subscribing while active fails with `AlreadySubscribed`. A paused
//! subscription keeps its slot under the cap, so it can always resume.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::{EventType, Subscription, SubscriptionStore};
    pub use crate::errors::SubscriptionError;
    pub use crate::ports::EventSubscriptionApi;
    pub use crate::service::{create_test_service, SubscriptionService};
}

pub use domain::{EventType, Subscription};
pub use errors::SubscriptionError;
pub use ports::EventSubscriptionApi;
pub use service::{ServiceStats, SubscriptionService};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = shared_bus::subsystem_ids::EVENT_SUBSCRIPTIONS;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Event Subscription Manager";
