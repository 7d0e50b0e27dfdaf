//! # Event Publisher
//!
//! Publishing side of the kernel bus, plus the per-topic bookkeeping shared
//! with subscription handles.

use crate::events::{EventFilter, EventTopic, KernelEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for publishing committed kernel events.
///
/// Services call it only after a unit of work has committed.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event. Returns the number of receivers it reached.
    async fn publish(&self, event: KernelEvent) -> usize;

    /// Publish a batch of events in order.
    async fn publish_all(&self, events: Vec<KernelEvent>) -> usize {
        let mut delivered = 0;
        for event in events {
            delivered += self.publish(event).await;
        }
        delivered
    }

    /// Total number of events published.
    fn events_published(&self) -> u64;
}

/// Live subscription counts keyed by topic.
///
/// A filter with no topics, or one naming [`EventTopic::All`], is counted
/// under `All` and listens to every topic.
#[derive(Debug, Default)]
pub(crate) struct TopicListeners {
    counts: RwLock<HashMap<EventTopic, usize>>,
}

impl TopicListeners {
    fn keys(filter: &EventFilter) -> Vec<EventTopic> {
        if filter.topics.is_empty() || filter.topics.contains(&EventTopic::All) {
            return vec![EventTopic::All];
        }
        let mut keys = filter.topics.clone();
        keys.sort_by_key(|t| *t as u8);
        keys.dedup();
        keys
    }

    pub(crate) fn add(&self, filter: &EventFilter) {
        if let Ok(mut counts) = self.counts.write() {
            for key in Self::keys(filter) {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
    }

    pub(crate) fn remove(&self, filter: &EventFilter) {
        let Ok(mut counts) = self.counts.write() else {
            return;
        };
        for key in Self::keys(filter) {
            if let Some(count) = counts.get_mut(&key) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    counts.remove(&key);
                }
            }
        }
    }

    /// Subscriptions that would see an event on `topic`.
    fn listening(&self, topic: EventTopic) -> usize {
        let Ok(counts) = self.counts.read() else {
            return 0;
        };
        let wildcard = counts.get(&EventTopic::All).copied().unwrap_or(0);
        if topic == EventTopic::All {
            return wildcard;
        }
        wildcard + counts.get(&topic).copied().unwrap_or(0)
    }
}

/// Point-in-time view of bus traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Events published since start.
    pub published: u64,
    /// Events published per topic.
    pub by_topic: HashMap<EventTopic, u64>,
    /// Open subscription handles.
    pub subscribers: usize,
}

/// In-memory implementation of the kernel bus.
///
/// Uses `tokio::sync::broadcast`. Subscribers that fall behind the channel
/// capacity lose the oldest events; publishers never block.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<KernelEvent>,
    listeners: Arc<TopicListeners>,
    published: AtomicU64,
    by_topic: RwLock<HashMap<EventTopic, u64>>,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Bus with [`DEFAULT_CHANNEL_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering at most `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            listeners: Arc::new(TopicListeners::default()),
            published: AtomicU64::new(0),
            by_topic: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.listeners.add(&filter);
        debug!(topics = ?filter.topics, "New bus subscription");
        Subscription::new(self.sender.subscribe(), filter, Arc::clone(&self.listeners))
    }

    /// Stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Open subscription handles.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Subscriptions whose filter admits `topic`.
    #[must_use]
    pub fn listeners_for(&self, topic: EventTopic) -> usize {
        self.listeners.listening(topic)
    }

    /// Events published on `topic`.
    #[must_use]
    pub fn published_on(&self, topic: EventTopic) -> u64 {
        self.by_topic
            .read()
            .map(|m| m.get(&topic).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    #[must_use]
    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.published.load(Ordering::Relaxed),
            by_topic: self.by_topic.read().map(|m| m.clone()).unwrap_or_default(),
            subscribers: self.subscriber_count(),
        }
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: KernelEvent) -> usize {
        let name = event.name();
        let topic = event.topic();

        self.published.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut by_topic) = self.by_topic.write() {
            *by_topic.entry(topic).or_insert(0) += 1;
        }

        if self.listeners.listening(topic) == 0 {
            trace!(event = name, ?topic, "No listeners for topic");
        }

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(event = name, ?topic, receivers, "Event published");
                receivers
            }
            Err(_) => 0,
        }
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

/// Publisher that drops everything. Useful when a service runs standalone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

#[async_trait]
impl EventPublisher for NullPublisher {
    async fn publish(&self, _event: KernelEvent) -> usize {
        0
    }

    fn events_published(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::entities::{Address, Keycode};

    fn registry_event() -> KernelEvent {
        KernelEvent::ModuleRegistered {
            keycode: Keycode::from_leading_byte(1),
            implementation: Address::from_low_u16(1),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_still_counts() {
        let bus = InMemoryEventBus::new();
        assert_eq!(bus.publish(registry_event()).await, 0);
        assert_eq!(bus.events_published(), 1);
        assert_eq!(bus.published_on(EventTopic::Registry), 1);
    }

    #[tokio::test]
    async fn test_receiver_count_ignores_filters() {
        let bus = InMemoryEventBus::new();
        let _all = bus.subscribe(EventFilter::all());
        let _queues = bus.subscribe(EventFilter::topics(vec![EventTopic::EventQueue]));

        // Filtering happens on receive, so both receivers get the send.
        assert_eq!(bus.publish(registry_event()).await, 2);
        assert_eq!(bus.listeners_for(EventTopic::Registry), 1);
        assert_eq!(bus.listeners_for(EventTopic::EventQueue), 2);
    }

    #[test]
    fn test_listener_bookkeeping() {
        let bus = InMemoryEventBus::new();
        let dup = bus.subscribe(EventFilter::topics(vec![
            EventTopic::Authority,
            EventTopic::Authority,
            EventTopic::Subscriptions,
        ]));
        let wildcard = bus.subscribe(EventFilter::topics(vec![EventTopic::All, EventTopic::Registry]));

        assert_eq!(bus.listeners_for(EventTopic::Authority), 2);
        assert_eq!(bus.listeners_for(EventTopic::Validation), 1);
        assert_eq!(bus.listeners_for(EventTopic::All), 1);

        drop(wildcard);
        assert_eq!(bus.listeners_for(EventTopic::Validation), 0);
        assert_eq!(bus.listeners_for(EventTopic::Subscriptions), 1);

        drop(dup);
        assert_eq!(bus.listeners_for(EventTopic::Authority), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let bus = InMemoryEventBus::with_capacity(0);
        assert_eq!(bus.capacity(), 1);

        let _sub = bus.subscribe(EventFilter::all());
        bus.publish_all(vec![registry_event(), KernelEvent::QueuePaused { queue_id: 1 }])
            .await;

        let stats = bus.stats();
        assert_eq!(stats.published, 2);
        assert_eq!(stats.subscribers, 1);
        assert_eq!(stats.by_topic.get(&EventTopic::EventQueue), Some(&1));
        assert_eq!(stats.by_topic.get(&EventTopic::Validation), None);
    }

    #[tokio::test]
    async fn test_null_publisher() {
        assert_eq!(NullPublisher.publish(registry_event()).await, 0);
        assert_eq!(NullPublisher.events_published(), 0);
    }
}
