//! # Subscription Entities

use serde::{Deserialize, Serialize};
use shared_types::entities::{Address, EventTypeId, Timestamp};

/// A registered event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    /// `keccak256(name)`.
    pub id: EventTypeId,
    pub name: String,
    pub description: String,
    /// Subscriber cap; `0` means unlimited.
    pub max_subscribers: u32,
    pub created_at: Timestamp,
    pub creator: Address,
}

impl EventType {
    /// Returns true if `count` subscriptions leave no room for another.
    #[must_use]
    pub fn is_full(&self, count: usize) -> bool {
        self.max_subscribers != 0 && count >= self.max_subscribers as usize
    }
}

/// One (event type, subscriber) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub event_type: EventTypeId,
    pub subscriber: Address,
    pub created_at: Timestamp,
    /// Paused subscriptions keep their slot but are skipped by `notify`.
    pub is_paused: bool,
    pub last_notified_at: Option<Timestamp>,
}

/// What `subscribe` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// A fresh subscription was created.
    Created,
    /// A paused subscription was resumed.
    Resumed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_type(max_subscribers: u32) -> EventType {
        EventType {
            id: EventTypeId::of_name("MatchFinished"),
            name: "MatchFinished".to_string(),
            description: String::new(),
            max_subscribers,
            created_at: 0,
            creator: Address::from_low_u16(1),
        }
    }

    #[test]
    fn test_zero_cap_is_unlimited() {
        assert!(!event_type(0).is_full(usize::MAX));
    }

    #[test]
    fn test_cap() {
        let capped = event_type(2);
        assert!(!capped.is_full(1));
        assert!(capped.is_full(2));
    }
}
