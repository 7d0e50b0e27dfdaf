//! # Subscription Scenarios

#[cfg(test)]
mod tests {
    use super::super::harness::{boot, next_event, ADMIN, START_MS};
    use ark_05_event_subscriptions::{EventSubscriptionApi, SubscriptionError};
    use shared_bus::{EventFilter, EventTopic, KernelEvent};
    use shared_types::entities::{Address, EventTypeId};

    const PUBLISHER: Address = Address::from_low_u16(0x9B);
    const ALICE: Address = Address::from_low_u16(0xA1);
    const BOB: Address = Address::from_low_u16(0xB0);
    const CAROL: Address = Address::from_low_u16(0xCA);

    #[tokio::test]
    async fn test_subscribe_pause_resubscribe_unsubscribe() {
        let kernel = boot();
        let subs = &kernel.container.subscriptions;
        let id = subs
            .register_event_type(ADMIN, "MatchFinished".to_string(), String::new(), 0)
            .await
            .unwrap();

        subs.subscribe(ALICE, id).await.unwrap();
        subs.pause_subscription(ALICE, id).await.unwrap();
        subs.subscribe(ALICE, id).await.unwrap();
        assert!(subs.is_subscribed(id, ALICE).await);

        subs.unsubscribe(ALICE, id).await.unwrap();
        assert!(!subs.is_subscribed(id, ALICE).await);
        subs.subscribe(ALICE, id).await.unwrap();
        assert!(subs.is_subscribed(id, ALICE).await);
    }

    #[tokio::test]
    async fn test_delegated_publisher_notifies_active_subscribers() {
        let kernel = boot();
        let subs = &kernel.container.subscriptions;
        subs.add_authorized_caller(ADMIN, PUBLISHER).await.unwrap();

        let id = subs
            .register_event_type(PUBLISHER, "RoundClosed".to_string(), "round ended".to_string(), 0)
            .await
            .unwrap();
        assert_eq!(id, EventTypeId::of_name("RoundClosed"));

        for who in [ALICE, BOB, CAROL] {
            subs.subscribe(who, id).await.unwrap();
        }
        subs.pause_subscription(BOB, id).await.unwrap();

        let mut sub = kernel.subscribe(EventFilter::topics(vec![EventTopic::Subscriptions]));
        kernel.clock.advance(5);
        let notified = subs.notify(PUBLISHER, id, b"round-9".to_vec()).await.unwrap();
        assert_eq!(notified, vec![ALICE, CAROL]);

        match next_event(&mut sub).await {
            KernelEvent::SubscribersNotified { subscribers, .. } => {
                assert_eq!(subscribers, vec![ALICE, CAROL]);
            }
            other => panic!("unexpected event {other:?}"),
        }
        let alice = subs.get_subscription(id, ALICE).await.unwrap();
        assert_eq!(alice.last_notified_at, Some(START_MS + 5));

        subs.remove_authorized_caller(ADMIN, PUBLISHER).await.unwrap();
        assert_eq!(
            subs.notify(PUBLISHER, id, Vec::new()).await,
            Err(SubscriptionError::Unauthorized { caller: PUBLISHER })
        );
    }

    #[tokio::test]
    async fn test_cap_admits_resume_but_not_newcomers() {
        let kernel = boot();
        let subs = &kernel.container.subscriptions;
        let id = subs
            .register_event_type(ADMIN, "Limited".to_string(), String::new(), 2)
            .await
            .unwrap();

        subs.subscribe(ALICE, id).await.unwrap();
        subs.subscribe(BOB, id).await.unwrap();
        subs.pause_subscription(BOB, id).await.unwrap();

        assert_eq!(
            subs.subscribe(CAROL, id).await,
            Err(SubscriptionError::MaxSubscribersReached {
                event_type: id,
                max: 2
            })
        );
        subs.subscribe(BOB, id).await.unwrap();

        subs.unsubscribe(ALICE, id).await.unwrap();
        subs.subscribe(CAROL, id).await.unwrap();
        assert_eq!(subs.subscriber_count(id).await.unwrap(), 2);
        assert_eq!(subs.get_subscriptions(CAROL).await, vec![id]);
    }
}
