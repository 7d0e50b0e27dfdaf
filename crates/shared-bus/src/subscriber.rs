//! # Event Subscriber
//!
//! Receiving side of the kernel bus. A subscriber that falls behind the
//! channel capacity skips the oldest events and keeps a running count of
//! what it missed.

use crate::events::{EventFilter, KernelEvent};
use crate::publisher::TopicListeners;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// Errors from bus subscriptions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The event bus was dropped.
    #[error("Event bus closed")]
    Closed,
}

/// Handle for receiving filtered events.
///
/// Dropping the handle releases its topic registration on the bus.
pub struct Subscription {
    receiver: broadcast::Receiver<KernelEvent>,
    filter: EventFilter,
    listeners: Arc<TopicListeners>,
    missed: u64,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<KernelEvent>,
        filter: EventFilter,
        listeners: Arc<TopicListeners>,
    ) -> Self {
        Self {
            receiver,
            filter,
            listeners,
            missed: 0,
        }
    }

    fn lagged(&mut self, count: u64) {
        self.missed += count;
        warn!(lagged = count, total = self.missed, "Subscriber lagged, oldest events dropped");
    }

    /// Wait for the next matching event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<KernelEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(count)) => self.lagged(count),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next matching event without waiting.
    ///
    /// # Errors
    ///
    /// `BusError::Closed` if the bus was dropped.
    pub fn try_recv(&mut self) -> Result<Option<KernelEvent>, BusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(count)) => self.lagged(count),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(BusError::Closed),
            }
        }
    }

    /// Take every matching event currently buffered.
    pub fn drain(&mut self) -> Vec<KernelEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Events skipped because this subscriber fell behind.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.listeners.remove(&self.filter);
        debug!(topics = ?self.filter.topics, missed = self.missed, "Bus subscription dropped");
    }
}

/// A `Stream` over matching events, for observers driven by `StreamExt`.
pub struct EventStream {
    inner: BroadcastStream<KernelEvent>,
    // Keeps the topic registration alive for the stream's lifetime.
    subscription: Subscription,
}

impl EventStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self {
            inner: BroadcastStream::new(subscription.receiver.resubscribe()),
            subscription,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.subscription.filter
    }

    /// Events skipped because the stream fell behind.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.subscription.missed
    }
}

impl Stream for EventStream {
    type Item = KernelEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) if self.subscription.filter.matches(&event) => {
                    return Poll::Ready(Some(event));
                }
                Poll::Ready(Some(Ok(_))) => {}
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    self.subscription.lagged(count);
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;
    use crate::publisher::{EventPublisher, InMemoryEventBus};
    use shared_types::entities::{Address, Keycode};
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    fn registry_event() -> KernelEvent {
        KernelEvent::ModuleRegistered {
            keycode: Keycode::from_leading_byte(0xA1),
            implementation: Address::from_low_u16(0x1111),
        }
    }

    fn queue_event(queue_id: u64) -> KernelEvent {
        KernelEvent::QueuePaused { queue_id }
    }

    #[tokio::test]
    async fn test_recv_skips_filtered_topics() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::EventQueue]));

        bus.publish(registry_event()).await;
        bus.publish(queue_event(3)).await;

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout");
        assert_eq!(received, Some(queue_event(3)));
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_bus_dropped() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());
        drop(bus);
        assert_eq!(sub.recv().await, None);
        assert_eq!(sub.try_recv(), Err(BusError::Closed));
    }

    #[tokio::test]
    async fn test_drain_in_publish_order() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());
        assert_eq!(sub.try_recv(), Ok(None));

        bus.publish(registry_event()).await;
        bus.publish(queue_event(1)).await;

        assert_eq!(sub.drain(), vec![registry_event(), queue_event(1)]);
        assert!(sub.drain().is_empty());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_counts_missed() {
        let bus = InMemoryEventBus::with_capacity(2);
        let mut sub = bus.subscribe(EventFilter::all());

        for id in 0..5 {
            bus.publish(queue_event(id)).await;
        }

        assert_eq!(sub.drain(), vec![queue_event(3), queue_event(4)]);
        assert_eq!(sub.missed(), 3);
    }

    #[tokio::test]
    async fn test_event_stream_filters() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.event_stream(EventFilter::topics(vec![EventTopic::Registry]));
        assert_eq!(EventStream::filter(&stream).topics, vec![EventTopic::Registry]);
        assert_eq!(bus.listeners_for(EventTopic::Registry), 1);

        bus.publish(queue_event(9)).await;
        bus.publish(registry_event()).await;

        let next = timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("timeout");
        assert_eq!(next, Some(registry_event()));
        assert_eq!(stream.missed(), 0);
    }
}
