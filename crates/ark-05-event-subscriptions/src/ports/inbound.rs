//! # Driving Ports (API - Inbound)

use crate::domain::entities::{EventType, Subscription};
use crate::errors::SubscriptionError;
use async_trait::async_trait;
use shared_types::entities::{Address, EventTypeId};

/// Primary API for event types and subscriptions.
///
/// Event types and notifications are restricted to admins and authorized
/// callers. Subscriptions are managed by the subscriber itself.
#[async_trait]
pub trait EventSubscriptionApi: Send + Sync {
    /// Register an event type under `keccak256(name)`. A cap of `0` is unlimited.
    async fn register_event_type(
        &self,
        caller: Address,
        name: String,
        description: String,
        max_subscribers: u32,
    ) -> Result<EventTypeId, SubscriptionError>;

    /// Change an event type's subscriber cap.
    async fn set_max_subscribers(
        &self,
        caller: Address,
        event_type: EventTypeId,
        max_subscribers: u32,
    ) -> Result<(), SubscriptionError>;

    /// Admin only.
    async fn add_authorized_caller(&self, caller: Address, account: Address) -> Result<(), SubscriptionError>;

    /// Admin only.
    async fn remove_authorized_caller(&self, caller: Address, account: Address) -> Result<(), SubscriptionError>;

    async fn is_authorized_caller(&self, account: Address) -> bool;

    /// Subscribe `subscriber`, or resume its paused subscription.
    async fn subscribe(&self, subscriber: Address, event_type: EventTypeId) -> Result<(), SubscriptionError>;

    async fn unsubscribe(&self, subscriber: Address, event_type: EventTypeId) -> Result<(), SubscriptionError>;

    async fn pause_subscription(&self, subscriber: Address, event_type: EventTypeId) -> Result<(), SubscriptionError>;

    async fn resume_subscription(&self, subscriber: Address, event_type: EventTypeId) -> Result<(), SubscriptionError>;

    /// Notify the active subscribers of `event_type` and return them.
    async fn notify(
        &self,
        caller: Address,
        event_type: EventTypeId,
        payload: Vec<u8>,
    ) -> Result<Vec<Address>, SubscriptionError>;

    async fn get_event_type(&self, event_type: EventTypeId) -> Result<EventType, SubscriptionError>;

    /// Event types in registration order.
    async fn list_event_types(&self) -> Vec<EventType>;

    async fn get_subscription(
        &self,
        event_type: EventTypeId,
        subscriber: Address,
    ) -> Result<Subscription, SubscriptionError>;

    /// True only for an active subscription.
    async fn is_subscribed(&self, event_type: EventTypeId, subscriber: Address) -> bool;

    /// All subscribers, paused included.
    async fn get_subscribers(&self, event_type: EventTypeId) -> Result<Vec<Address>, SubscriptionError>;

    async fn get_active_subscribers(&self, event_type: EventTypeId) -> Result<Vec<Address>, SubscriptionError>;

    /// Event types `subscriber` holds a subscription to.
    async fn get_subscriptions(&self, subscriber: Address) -> Vec<EventTypeId>;

    async fn subscriber_count(&self, event_type: EventTypeId) -> Result<usize, SubscriptionError>;
}
