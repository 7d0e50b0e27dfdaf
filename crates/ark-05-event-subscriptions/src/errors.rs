//! # Error Types

use shared_types::entities::{Address, EventTypeId};
use thiserror::Error;

/// Errors raised by the subscription manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Caller is neither an admin nor an authorized caller.
    #[error("unauthorized caller: {caller}")]
    Unauthorized { caller: Address },

    #[error("event type not found: {0}")]
    EventTypeNotFound(EventTypeId),

    #[error("event type already exists: {0}")]
    EventTypeAlreadyExists(EventTypeId),

    /// An active subscription already exists for the pair.
    #[error("{subscriber} already subscribed to {event_type}")]
    AlreadySubscribed {
        event_type: EventTypeId,
        subscriber: Address,
    },

    #[error("{subscriber} is not subscribed to {event_type}")]
    NotSubscribed {
        event_type: EventTypeId,
        subscriber: Address,
    },

    /// The event type's subscriber cap is reached.
    #[error("event type {event_type} is full ({max} subscribers)")]
    MaxSubscribersReached { event_type: EventTypeId, max: u32 },

    #[error("already an authorized caller: {0}")]
    AlreadyAuthorized(Address),

    #[error("not an authorized caller: {0}")]
    NotAuthorizedCaller(Address),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("zero address")]
    ZeroAddress,
}

impl SubscriptionError {
    /// Short snake_case kind, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::EventTypeNotFound(_) => "event_type_not_found",
            Self::EventTypeAlreadyExists(_) => "event_type_already_exists",
            Self::AlreadySubscribed { .. } => "already_subscribed",
            Self::NotSubscribed { .. } => "not_subscribed",
            Self::MaxSubscribersReached { .. } => "max_subscribers_reached",
            Self::AlreadyAuthorized(_) => "already_authorized",
            Self::NotAuthorizedCaller(_) => "not_authorized_caller",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::ZeroAddress => "zero_address",
        }
    }
}
