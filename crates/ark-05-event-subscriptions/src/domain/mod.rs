//! # Domain Layer
//!
//! Event types and subscriptions. Pure and synchronous.

pub mod entities;
pub mod store;

pub use entities::{EventType, SubscribeOutcome, Subscription};
pub use store::SubscriptionStore;
