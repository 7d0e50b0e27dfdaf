//! # Subscription Store
//!
//! Event types, authorized callers and subscriptions. Each subscription is
//! indexed twice, once under its event type and once under its subscriber.
//! Both index lists drop entries by swap-with-last-and-pop, so their order
//! is not subscription order once anything has been removed.

use crate::domain::entities::{EventType, SubscribeOutcome, Subscription};
use crate::errors::SubscriptionError;
use shared_types::entities::{Address, EventTypeId, Timestamp};
use std::collections::{BTreeSet, HashMap};

/// Subscription manager state.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionStore {
    event_types: HashMap<EventTypeId, EventType>,
    /// Registration order.
    type_order: Vec<EventTypeId>,
    authorized_callers: BTreeSet<Address>,
    subscriptions: HashMap<(EventTypeId, Address), Subscription>,
    by_type: HashMap<EventTypeId, Vec<Address>>,
    by_subscriber: HashMap<Address, Vec<EventTypeId>>,
}

fn swap_pop<T: PartialEq>(list: &mut Vec<T>, item: &T) {
    if let Some(position) = list.iter().position(|x| x == item) {
        list.swap_remove(position);
    }
}

impl SubscriptionStore {
    // =========================================================================
    // EVENT TYPES
    // =========================================================================

    /// Registers an event type under `keccak256(name)`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for an empty name, `EventTypeAlreadyExists`.
    pub fn register_event_type(
        &mut self,
        name: &str,
        description: &str,
        max_subscribers: u32,
        creator: Address,
        now: Timestamp,
    ) -> Result<EventTypeId, SubscriptionError> {
        if name.trim().is_empty() {
            return Err(SubscriptionError::InvalidParameter(
                "event type name must not be empty".to_string(),
            ));
        }
        let id = EventTypeId::of_name(name);
        if self.event_types.contains_key(&id) {
            return Err(SubscriptionError::EventTypeAlreadyExists(id));
        }

        self.event_types.insert(
            id,
            EventType {
                id,
                name: name.to_string(),
                description: description.to_string(),
                max_subscribers,
                created_at: now,
                creator,
            },
        );
        self.type_order.push(id);
        self.by_type.insert(id, Vec::new());
        Ok(id)
    }

    /// Changes the subscriber cap.
    ///
    /// # Errors
    ///
    /// `EventTypeNotFound`, or `InvalidParameter` if the new cap is below the
    /// current subscriber count.
    pub fn set_max_subscribers(&mut self, id: EventTypeId, max: u32) -> Result<(), SubscriptionError> {
        let count = self.subscriber_count(&id)?;
        if max != 0 && (max as usize) < count {
            return Err(SubscriptionError::InvalidParameter(format!(
                "max_subscribers {max} is below the current {count} subscribers"
            )));
        }
        if let Some(event_type) = self.event_types.get_mut(&id) {
            event_type.max_subscribers = max;
        }
        Ok(())
    }

    /// Looks up an event type.
    ///
    /// # Errors
    ///
    /// `EventTypeNotFound`.
    pub fn event_type(&self, id: &EventTypeId) -> Result<&EventType, SubscriptionError> {
        self.event_types
            .get(id)
            .ok_or(SubscriptionError::EventTypeNotFound(*id))
    }

    /// Event types in registration order.
    pub fn event_types(&self) -> impl Iterator<Item = &EventType> {
        self.type_order
            .iter()
            .filter_map(|id| self.event_types.get(id))
    }

    // =========================================================================
    // AUTHORIZED CALLERS
    // =========================================================================

    /// Admits `account` to register event types and notify.
    ///
    /// # Errors
    ///
    /// `ZeroAddress`, `AlreadyAuthorized`.
    pub fn add_authorized_caller(&mut self, account: Address) -> Result<(), SubscriptionError> {
        if account.is_zero() {
            return Err(SubscriptionError::ZeroAddress);
        }
        if !self.authorized_callers.insert(account) {
            return Err(SubscriptionError::AlreadyAuthorized(account));
        }
        Ok(())
    }

    /// Revokes an authorized caller.
    ///
    /// # Errors
    ///
    /// `NotAuthorizedCaller`.
    pub fn remove_authorized_caller(&mut self, account: Address) -> Result<(), SubscriptionError> {
        if !self.authorized_callers.remove(&account) {
            return Err(SubscriptionError::NotAuthorizedCaller(account));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_authorized_caller(&self, account: &Address) -> bool {
        self.authorized_callers.contains(account)
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Subscribes, or resumes a paused subscription.
    ///
    /// # Errors
    ///
    /// `ZeroAddress`, `EventTypeNotFound`, `AlreadySubscribed` for an active
    /// subscription, `MaxSubscribersReached` for a new one at the cap.
    pub fn subscribe(
        &mut self,
        event_type: EventTypeId,
        subscriber: Address,
        now: Timestamp,
    ) -> Result<SubscribeOutcome, SubscriptionError> {
        if subscriber.is_zero() {
            return Err(SubscriptionError::ZeroAddress);
        }
        self.event_type(&event_type)?;

        if let Some(existing) = self.subscriptions.get_mut(&(event_type, subscriber)) {
            if !existing.is_paused {
                return Err(SubscriptionError::AlreadySubscribed {
                    event_type,
                    subscriber,
                });
            }
            existing.is_paused = false;
            return Ok(SubscribeOutcome::Resumed);
        }

        let count = self.by_type.get(&event_type).map_or(0, Vec::len);
        let kind = self.event_type(&event_type)?;
        if kind.is_full(count) {
            return Err(SubscriptionError::MaxSubscribersReached {
                event_type,
                max: kind.max_subscribers,
            });
        }

        self.subscriptions.insert(
            (event_type, subscriber),
            Subscription {
                event_type,
                subscriber,
                created_at: now,
                is_paused: false,
                last_notified_at: None,
            },
        );
        self.by_type.entry(event_type).or_default().push(subscriber);
        self.by_subscriber
            .entry(subscriber)
            .or_default()
            .push(event_type);
        Ok(SubscribeOutcome::Created)
    }

    /// Deletes a subscription, active or paused.
    ///
    /// # Errors
    ///
    /// `NotSubscribed`.
    pub fn unsubscribe(&mut self, event_type: EventTypeId, subscriber: Address) -> Result<Subscription, SubscriptionError> {
        let removed = self
            .subscriptions
            .remove(&(event_type, subscriber))
            .ok_or(SubscriptionError::NotSubscribed {
                event_type,
                subscriber,
            })?;

        if let Some(list) = self.by_type.get_mut(&event_type) {
            swap_pop(list, &subscriber);
        }
        if let Some(list) = self.by_subscriber.get_mut(&subscriber) {
            swap_pop(list, &event_type);
            if list.is_empty() {
                self.by_subscriber.remove(&subscriber);
            }
        }
        Ok(removed)
    }

    /// Sets the paused flag of an existing subscription.
    ///
    /// # Errors
    ///
    /// `NotSubscribed`.
    pub fn set_paused(&mut self, event_type: EventTypeId, subscriber: Address, paused: bool) -> Result<(), SubscriptionError> {
        let subscription = self
            .subscriptions
            .get_mut(&(event_type, subscriber))
            .ok_or(SubscriptionError::NotSubscribed {
                event_type,
                subscriber,
            })?;
        subscription.is_paused = paused;
        Ok(())
    }

    /// Stamps every active subscriber of `event_type` and returns them in
    /// index order.
    ///
    /// # Errors
    ///
    /// `EventTypeNotFound`.
    pub fn notify(&mut self, event_type: EventTypeId, now: Timestamp) -> Result<Vec<Address>, SubscriptionError> {
        let active = self.active_subscribers(&event_type)?;
        for subscriber in &active {
            if let Some(subscription) = self.subscriptions.get_mut(&(event_type, *subscriber)) {
                subscription.last_notified_at = Some(now);
            }
        }
        Ok(active)
    }

    // =========================================================================
    // READS
    // =========================================================================

    #[must_use]
    pub fn subscription(&self, event_type: &EventTypeId, subscriber: &Address) -> Option<&Subscription> {
        self.subscriptions.get(&(*event_type, *subscriber))
    }

    /// Returns true for an active (non-paused) subscription.
    #[must_use]
    pub fn is_subscribed(&self, event_type: &EventTypeId, subscriber: &Address) -> bool {
        self.subscription(event_type, subscriber)
            .is_some_and(|s| !s.is_paused)
    }

    /// All subscribers of `event_type`, paused included, in index order.
    ///
    /// # Errors
    ///
    /// `EventTypeNotFound`.
    pub fn subscribers(&self, event_type: &EventTypeId) -> Result<Vec<Address>, SubscriptionError> {
        self.event_type(event_type)?;
        Ok(self.by_type.get(event_type).cloned().unwrap_or_default())
    }

    /// Non-paused subscribers of `event_type`, in index order.
    ///
    /// # Errors
    ///
    /// `EventTypeNotFound`.
    pub fn active_subscribers(&self, event_type: &EventTypeId) -> Result<Vec<Address>, SubscriptionError> {
        Ok(self
            .subscribers(event_type)?
            .into_iter()
            .filter(|s| self.is_subscribed(event_type, s))
            .collect())
    }

    /// Event types `subscriber` is subscribed to, paused included.
    #[must_use]
    pub fn subscriptions_of(&self, subscriber: &Address) -> Vec<EventTypeId> {
        self.by_subscriber
            .get(subscriber)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of subscriptions to `event_type`, paused included.
    ///
    /// # Errors
    ///
    /// `EventTypeNotFound`.
    pub fn subscriber_count(&self, event_type: &EventTypeId) -> Result<usize, SubscriptionError> {
        self.event_type(event_type)?;
        Ok(self.by_type.get(event_type).map_or(0, Vec::len))
    }

    /// Total number of subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Returns true if both index lists agree with the subscription map.
    #[must_use]
    pub fn indexes_are_consistent(&self) -> bool {
        let by_type: usize = self.by_type.values().map(Vec::len).sum();
        let by_subscriber: usize = self.by_subscriber.values().map(Vec::len).sum();
        by_type == self.subscriptions.len()
            && by_subscriber == self.subscriptions.len()
            && self.by_type.iter().all(|(t, subs)| {
                subs.iter()
                    .all(|s| self.subscriptions.contains_key(&(*t, *s)))
            })
            && self.by_subscriber.iter().all(|(s, types)| {
                types
                    .iter()
                    .all(|t| self.subscriptions.contains_key(&(*t, *s)))
            })
    }
}
