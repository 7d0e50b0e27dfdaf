//! # Event Subscription Service

use crate::domain::entities::{EventType, SubscribeOutcome, Subscription};
use crate::domain::store::SubscriptionStore;
use crate::errors::SubscriptionError;
use crate::ports::inbound::EventSubscriptionApi;

use async_trait::async_trait;
use shared_bus::{EventPublisher, KernelEvent, NullPublisher};
use shared_types::entities::{Address, EventTypeId, Timestamp};
use shared_types::security::{AdminScope, SharedPolicy, SingleAdminPolicy};
use shared_types::time::{SystemTimeSource, TimeSource};
use shared_types::unit_of_work::{transact, UnitOfWork};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Statistics for the subscription service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    pub event_types_registered: u64,
    pub subscriptions_created: u64,
    pub subscriptions_removed: u64,
    /// Individual subscriber notifications, not `notify` calls.
    pub notifications_sent: u64,
    pub rejected_calls: u64,
}

impl ServiceStats {
    fn record(&mut self, event: &KernelEvent) {
        match event {
            KernelEvent::EventTypeRegistered { .. } => self.event_types_registered += 1,
            KernelEvent::Subscribed { .. } => self.subscriptions_created += 1,
            KernelEvent::Unsubscribed { .. } => self.subscriptions_removed += 1,
            KernelEvent::SubscribersNotified { subscribers, .. } => {
                self.notifications_sent += subscribers.len() as u64;
            }
            _ => {}
        }
    }
}

/// Who may perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Admitted by the policy.
    Admin,
    /// Admitted by the policy or in the authorized caller set.
    Publisher,
    /// Anyone; the caller acts on its own subscriptions.
    Subscriber,
}

type Uow = UnitOfWork<SubscriptionStore, KernelEvent>;

/// The event subscription service.
pub struct SubscriptionService {
    store: RwLock<SubscriptionStore>,
    policy: SharedPolicy,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn TimeSource>,
    stats: RwLock<ServiceStats>,
}

impl SubscriptionService {
    /// Create an empty service.
    pub fn new(policy: SharedPolicy, publisher: Arc<dyn EventPublisher>, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            store: RwLock::new(SubscriptionStore::default()),
            policy,
            publisher,
            clock,
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    fn admits(&self, store: &SubscriptionStore, caller: &Address, access: Access) -> bool {
        let admin = self.policy.is_authorized(caller, AdminScope::EventTypes);
        match access {
            Access::Admin => admin,
            Access::Publisher => admin || store.is_authorized_caller(caller),
            Access::Subscriber => true,
        }
    }

    /// Authorize `caller`, run `f` as one unit of work, publish on commit.
    ///
    /// Authorization reads the authorized caller set under the same write
    /// guard as the mutation.
    async fn commit<T, F>(&self, caller: Address, access: Access, op: &'static str, f: F) -> Result<T, SubscriptionError>
    where
        F: FnOnce(&mut Uow, Timestamp) -> Result<T, SubscriptionError>,
    {
        let now = self.clock.now();
        let mut store = self.store.write().await;
        let result = if self.admits(&store, &caller, access) {
            transact(&mut *store, |uow: &mut Uow| f(uow, now))
        } else {
            Err(SubscriptionError::Unauthorized { caller })
        };

        match result {
            Ok((value, events)) => {
                {
                    let mut stats = self.stats.write().await;
                    events.iter().for_each(|e| stats.record(e));
                }
                info!(op, "Subscription change committed");
                // Published under the write guard so bus order is commit order.
                self.publisher.publish_all(events).await;
                drop(store);
                Ok(value)
            }
            Err(err) => {
                drop(store);
                warn!(op, error = %err, "Subscription call rejected");
                self.stats.write().await.rejected_calls += 1;
                Err(err)
            }
        }
    }

    async fn set_paused(&self, subscriber: Address, event_type: EventTypeId, paused: bool) -> Result<(), SubscriptionError> {
        let op = if paused { "pause_subscription" } else { "resume_subscription" };
        self.commit(subscriber, Access::Subscriber, op, |uow, _| {
            uow.state_mut().set_paused(event_type, subscriber, paused)?;
            uow.emit(if paused {
                KernelEvent::SubscriptionPaused {
                    event_type,
                    subscriber,
                }
            } else {
                KernelEvent::SubscriptionResumed {
                    event_type,
                    subscriber,
                }
            });
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl EventSubscriptionApi for SubscriptionService {
    #[instrument(skip(self, description), fields(caller = %caller))]
    async fn register_event_type(
        &self,
        caller: Address,
        name: String,
        description: String,
        max_subscribers: u32,
    ) -> Result<EventTypeId, SubscriptionError> {
        self.commit(caller, Access::Publisher, "register_event_type", |uow, now| {
            let event_type = uow.state_mut().register_event_type(
                &name,
                &description,
                max_subscribers,
                caller,
                now,
            )?;
            uow.emit(KernelEvent::EventTypeRegistered {
                event_type,
                name: name.clone(),
                max_subscribers,
            });
            Ok(event_type)
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, event_type = %event_type))]
    async fn set_max_subscribers(
        &self,
        caller: Address,
        event_type: EventTypeId,
        max_subscribers: u32,
    ) -> Result<(), SubscriptionError> {
        self.commit(caller, Access::Publisher, "set_max_subscribers", |uow, _| {
            uow.state_mut()
                .set_max_subscribers(event_type, max_subscribers)?;
            uow.emit(KernelEvent::EventTypeUpdated {
                event_type,
                max_subscribers,
            });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, account = %account))]
    async fn add_authorized_caller(&self, caller: Address, account: Address) -> Result<(), SubscriptionError> {
        self.commit(caller, Access::Admin, "add_authorized_caller", |uow, _| {
            uow.state_mut().add_authorized_caller(account)?;
            uow.emit(KernelEvent::AuthorizedCallerAdded { account });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, account = %account))]
    async fn remove_authorized_caller(&self, caller: Address, account: Address) -> Result<(), SubscriptionError> {
        self.commit(caller, Access::Admin, "remove_authorized_caller", |uow, _| {
            uow.state_mut().remove_authorized_caller(account)?;
            uow.emit(KernelEvent::AuthorizedCallerRemoved { account });
            Ok(())
        })
        .await
    }

    async fn is_authorized_caller(&self, account: Address) -> bool {
        self.store.read().await.is_authorized_caller(&account)
    }

    #[instrument(skip(self), fields(subscriber = %subscriber, event_type = %event_type))]
    async fn subscribe(&self, subscriber: Address, event_type: EventTypeId) -> Result<(), SubscriptionError> {
        self.commit(subscriber, Access::Subscriber, "subscribe", |uow, now| {
            let outcome = uow.state_mut().subscribe(event_type, subscriber, now)?;
            uow.emit(match outcome {
                SubscribeOutcome::Created => KernelEvent::Subscribed {
                    event_type,
                    subscriber,
                },
                SubscribeOutcome::Resumed => KernelEvent::SubscriptionResumed {
                    event_type,
                    subscriber,
                },
            });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(subscriber = %subscriber, event_type = %event_type))]
    async fn unsubscribe(&self, subscriber: Address, event_type: EventTypeId) -> Result<(), SubscriptionError> {
        self.commit(subscriber, Access::Subscriber, "unsubscribe", |uow, _| {
            uow.state_mut().unsubscribe(event_type, subscriber)?;
            uow.emit(KernelEvent::Unsubscribed {
                event_type,
                subscriber,
            });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(subscriber = %subscriber, event_type = %event_type))]
    async fn pause_subscription(&self, subscriber: Address, event_type: EventTypeId) -> Result<(), SubscriptionError> {
        self.set_paused(subscriber, event_type, true).await
    }

    #[instrument(skip(self), fields(subscriber = %subscriber, event_type = %event_type))]
    async fn resume_subscription(&self, subscriber: Address, event_type: EventTypeId) -> Result<(), SubscriptionError> {
        self.set_paused(subscriber, event_type, false).await
    }

    #[instrument(skip(self, payload), fields(caller = %caller, event_type = %event_type))]
    async fn notify(
        &self,
        caller: Address,
        event_type: EventTypeId,
        payload: Vec<u8>,
    ) -> Result<Vec<Address>, SubscriptionError> {
        self.commit(caller, Access::Publisher, "notify", |uow, now| {
            let subscribers = uow.state_mut().notify(event_type, now)?;
            debug!(count = subscribers.len(), "Active subscribers stamped");
            uow.emit(KernelEvent::SubscribersNotified {
                event_type,
                subscribers: subscribers.clone(),
                payload,
            });
            Ok(subscribers)
        })
        .await
    }

    async fn get_event_type(&self, event_type: EventTypeId) -> Result<EventType, SubscriptionError> {
        self.store.read().await.event_type(&event_type).cloned()
    }

    async fn list_event_types(&self) -> Vec<EventType> {
        self.store.read().await.event_types().cloned().collect()
    }

    async fn get_subscription(
        &self,
        event_type: EventTypeId,
        subscriber: Address,
    ) -> Result<Subscription, SubscriptionError> {
        self.store
            .read()
            .await
            .subscription(&event_type, &subscriber)
            .cloned()
            .ok_or(SubscriptionError::NotSubscribed {
                event_type,
                subscriber,
            })
    }

    async fn is_subscribed(&self, event_type: EventTypeId, subscriber: Address) -> bool {
        self.store
            .read()
            .await
            .is_subscribed(&event_type, &subscriber)
    }

    async fn get_subscribers(&self, event_type: EventTypeId) -> Result<Vec<Address>, SubscriptionError> {
        self.store.read().await.subscribers(&event_type)
    }

    async fn get_active_subscribers(&self, event_type: EventTypeId) -> Result<Vec<Address>, SubscriptionError> {
        self.store.read().await.active_subscribers(&event_type)
    }

    async fn get_subscriptions(&self, subscriber: Address) -> Vec<EventTypeId> {
        self.store.read().await.subscriptions_of(&subscriber)
    }

    async fn subscriber_count(&self, event_type: EventTypeId) -> Result<usize, SubscriptionError> {
        self.store.read().await.subscriber_count(&event_type)
    }
}

/// Build a standalone service administered by `admin`.
pub fn create_test_service(admin: Address) -> SubscriptionService {
    SubscriptionService::new(
        Arc::new(SingleAdminPolicy::new(admin)),
        Arc::new(NullPublisher),
        Arc::new(SystemTimeSource),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus};
    use shared_types::time::ManualClock;

    const ADMIN: Address = Address::from_low_u16(0xAD);
    const PUBLISHER: Address = Address::from_low_u16(0x9B);
    const ALICE: Address = Address::from_low_u16(0xA1);
    const BOB: Address = Address::from_low_u16(0xB0);

    fn match_finished() -> EventTypeId {
        EventTypeId::of_name("MatchFinished")
    }

    fn service_with_bus() -> (SubscriptionService, Arc<InMemoryEventBus>, Arc<ManualClock>) {
        let bus = Arc::new(InMemoryEventBus::new());
        let clock = Arc::new(ManualClock::new(100));
        let service = SubscriptionService::new(
            Arc::new(SingleAdminPolicy::new(ADMIN)),
            bus.clone(),
            clock.clone(),
        );
        (service, bus, clock)
    }

    async fn with_event_type(max: u32) -> SubscriptionService {
        let service = create_test_service(ADMIN);
        service
            .register_event_type(ADMIN, "MatchFinished".to_string(), "a match ended".to_string(), max)
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_register_requires_admin_or_authorized_caller() {
        let service = create_test_service(ADMIN);
        assert_eq!(
            service
                .register_event_type(PUBLISHER, "MatchFinished".to_string(), String::new(), 0)
                .await,
            Err(SubscriptionError::Unauthorized { caller: PUBLISHER })
        );

        service.add_authorized_caller(ADMIN, PUBLISHER).await.unwrap();
        let id = service
            .register_event_type(PUBLISHER, "MatchFinished".to_string(), String::new(), 0)
            .await
            .unwrap();
        assert_eq!(id, match_finished());
        assert_eq!(service.get_event_type(id).await.unwrap().creator, PUBLISHER);
    }

    #[tokio::test]
    async fn test_authorized_callers_are_admin_only() {
        let service = create_test_service(ADMIN);
        service.add_authorized_caller(ADMIN, PUBLISHER).await.unwrap();
        assert_eq!(
            service.add_authorized_caller(PUBLISHER, ALICE).await,
            Err(SubscriptionError::Unauthorized { caller: PUBLISHER })
        );
        service.remove_authorized_caller(ADMIN, PUBLISHER).await.unwrap();
        assert!(!service.is_authorized_caller(PUBLISHER).await);
    }

    #[tokio::test]
    async fn test_subscription_idempotence() {
        let service = with_event_type(0).await;
        let id = match_finished();

        service.subscribe(ALICE, id).await.unwrap();
        service.pause_subscription(ALICE, id).await.unwrap();
        assert!(!service.is_subscribed(id, ALICE).await);

        service.subscribe(ALICE, id).await.unwrap();
        assert!(service.is_subscribed(id, ALICE).await);

        service.unsubscribe(ALICE, id).await.unwrap();
        service.subscribe(ALICE, id).await.unwrap();
        assert_eq!(service.subscriber_count(id).await.unwrap(), 1);
        assert_eq!(service.stats().await.subscriptions_created, 2);
    }

    #[tokio::test]
    async fn test_subscribe_active_twice_fails() {
        let service = with_event_type(0).await;
        let id = match_finished();
        service.subscribe(ALICE, id).await.unwrap();
        assert_eq!(
            service.subscribe(ALICE, id).await,
            Err(SubscriptionError::AlreadySubscribed {
                event_type: id,
                subscriber: ALICE
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_event_type() {
        let service = create_test_service(ADMIN);
        let id = match_finished();
        assert_eq!(
            service.subscribe(ALICE, id).await,
            Err(SubscriptionError::EventTypeNotFound(id))
        );
        assert_eq!(
            service.get_subscribers(id).await,
            Err(SubscriptionError::EventTypeNotFound(id))
        );
    }

    #[tokio::test]
    async fn test_cap_and_paused_resume() {
        let service = with_event_type(1).await;
        let id = match_finished();
        service.subscribe(ALICE, id).await.unwrap();
        service.pause_subscription(ALICE, id).await.unwrap();

        assert_eq!(
            service.subscribe(BOB, id).await,
            Err(SubscriptionError::MaxSubscribersReached {
                event_type: id,
                max: 1
            })
        );
        service.resume_subscription(ALICE, id).await.unwrap();
        assert_eq!(service.get_active_subscribers(id).await.unwrap(), vec![ALICE]);
    }

    #[tokio::test]
    async fn test_notify_publishes_and_stamps() {
        let (service, bus, clock) = service_with_bus();
        let id = service
            .register_event_type(ADMIN, "MatchFinished".to_string(), String::new(), 0)
            .await
            .unwrap();
        service.subscribe(ALICE, id).await.unwrap();
        service.subscribe(BOB, id).await.unwrap();
        service.pause_subscription(BOB, id).await.unwrap();

        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Subscriptions]));
        clock.advance(50);
        let notified = service.notify(ADMIN, id, b"score".to_vec()).await.unwrap();
        assert_eq!(notified, vec![ALICE]);
        assert_eq!(
            sub.drain(),
            vec![KernelEvent::SubscribersNotified {
                event_type: id,
                subscribers: vec![ALICE],
                payload: b"score".to_vec(),
            }]
        );
        assert_eq!(
            service.get_subscription(id, ALICE).await.unwrap().last_notified_at,
            Some(150)
        );
        assert_eq!(service.stats().await.notifications_sent, 1);
    }

    #[tokio::test]
    async fn test_notify_requires_publisher() {
        let service = with_event_type(0).await;
        assert_eq!(
            service.notify(ALICE, match_finished(), Vec::new()).await,
            Err(SubscriptionError::Unauthorized { caller: ALICE })
        );
    }

    #[tokio::test]
    async fn test_rejected_call_publishes_nothing() {
        let (service, bus, _) = service_with_bus();
        let mut sub = bus.subscribe(EventFilter::all());

        assert!(service.unsubscribe(ALICE, match_finished()).await.is_err());
        assert!(service
            .register_event_type(ADMIN, String::new(), String::new(), 0)
            .await
            .is_err());

        assert!(sub.drain().is_empty());
        assert_eq!(service.stats().await.rejected_calls, 2);
    }

    #[tokio::test]
    async fn test_set_max_subscribers() {
        let service = with_event_type(0).await;
        let id = match_finished();
        service.subscribe(ALICE, id).await.unwrap();
        service.subscribe(BOB, id).await.unwrap();

        assert!(matches!(
            service.set_max_subscribers(ADMIN, id, 1).await,
            Err(SubscriptionError::InvalidParameter(_))
        ));
        service.set_max_subscribers(ADMIN, id, 2).await.unwrap();
        assert_eq!(service.get_event_type(id).await.unwrap().max_subscribers, 2);
        assert_eq!(service.get_subscriptions(ALICE).await, vec![id]);
    }
}
