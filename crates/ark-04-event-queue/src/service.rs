//! # Event Queue Service
//!
//! Every queue operation is a single domain call that validates before it
//! mutates, so it runs in place as a [`Step`] over that queue (or over the
//! store for create and delete) without a snapshot. Events are published
//! before the write lock is released, so the bus sees them in commit order.
//!
//! Stuck events are not swept by a background task. The timeout is checked
//! lazily whenever `get_next_event` or `dequeue_event` runs, against the
//! injected [`TimeSource`].

use crate::domain::entities::{QueueInfo, QueuedEvent};
use crate::domain::queue::Queue;
use crate::domain::store::{QueueStore, SYSTEM_QUEUE_ID};
use crate::errors::QueueError;
use crate::ports::inbound::EventQueueApi;

use async_trait::async_trait;
use shared_bus::{EventPublisher, KernelEvent, NullPublisher};
use shared_types::entities::{Address, EventId, EventTypeId, QueueId, Timestamp};
use shared_types::time::{SystemTimeSource, TimeSource};
use shared_types::unit_of_work::{apply, Step};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

/// Event queue configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Owner of the system queue.
    pub system_owner: Address,
    /// Capacity of the system queue.
    pub system_queue_size: usize,
    /// Processing timeout of the system queue.
    pub processing_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            system_owner: Address::ZERO,
            system_queue_size: 1_000,
            processing_timeout_ms: 30_000,
        }
    }
}

/// Statistics for the event queue service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    pub events_enqueued: u64,
    pub events_dequeued: u64,
    pub events_reclaimed: u64,
    pub events_processed: u64,
    pub rejected_calls: u64,
}

impl ServiceStats {
    fn record(&mut self, event: &KernelEvent) {
        match event {
            KernelEvent::EventEnqueued { .. } => self.events_enqueued += 1,
            KernelEvent::EventDequeued { .. } => self.events_dequeued += 1,
            KernelEvent::EventReclaimed { .. } => self.events_reclaimed += 1,
            KernelEvent::EventProcessed { .. } => self.events_processed += 1,
            _ => {}
        }
    }
}

type QueueStep<'a> = Step<'a, Queue, KernelEvent>;
type StoreStep<'a> = Step<'a, QueueStore, KernelEvent>;

/// The event queue service.
pub struct EventQueueService {
    store: RwLock<QueueStore>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn TimeSource>,
    stats: RwLock<ServiceStats>,
}

impl EventQueueService {
    /// Create a service holding only the system queue.
    ///
    /// # Errors
    ///
    /// `ZeroAddress` for a null system owner, `InvalidParameter` for a zero
    /// system capacity.
    pub fn new(
        config: ServiceConfig,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, QueueError> {
        let store = QueueStore::with_system_queue(
            config.system_owner,
            config.system_queue_size,
            config.processing_timeout_ms,
            clock.now(),
        )?;
        info!(
            owner = %config.system_owner,
            max_size = config.system_queue_size,
            timeout_ms = config.processing_timeout_ms,
            "System queue created"
        );
        Ok(Self {
            store: RwLock::new(store),
            publisher,
            clock,
            stats: RwLock::new(ServiceStats::default()),
        })
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    async fn finish<T>(
        &self,
        op: &'static str,
        store: RwLockWriteGuard<'_, QueueStore>,
        result: Result<(T, Vec<KernelEvent>), QueueError>,
    ) -> Result<T, QueueError> {
        match result {
            Ok((value, events)) => {
                {
                    let mut stats = self.stats.write().await;
                    events.iter().for_each(|e| stats.record(e));
                }
                info!(op, events = events.len(), "Queue change committed");
                self.publisher.publish_all(events).await;
                drop(store);
                Ok(value)
            }
            Err(err) => {
                drop(store);
                warn!(op, error = %err, "Queue call rejected");
                self.stats.write().await.rejected_calls += 1;
                Err(err)
            }
        }
    }

    /// Run `f` in place over one queue.
    async fn commit_queue<T, F>(&self, op: &'static str, queue_id: QueueId, f: F) -> Result<T, QueueError>
    where
        F: FnOnce(&mut QueueStep<'_>, Timestamp) -> Result<T, QueueError>,
    {
        let now = self.clock.now();
        let mut store = self.store.write().await;
        let result = store
            .get_mut(queue_id)
            .and_then(|queue| apply(queue, |step: &mut QueueStep<'_>| f(step, now)));
        self.finish(op, store, result).await
    }

    /// Run `f` in place over the whole store.
    async fn commit_store<T, F>(&self, op: &'static str, f: F) -> Result<T, QueueError>
    where
        F: FnOnce(&mut StoreStep<'_>, Timestamp) -> Result<T, QueueError>,
    {
        let now = self.clock.now();
        let mut store = self.store.write().await;
        let result = apply(&mut *store, |step: &mut StoreStep<'_>| f(step, now));
        self.finish(op, store, result).await
    }

    async fn read_queue<T>(&self, queue_id: QueueId, f: impl FnOnce(&Queue) -> T) -> Result<T, QueueError> {
        let store = self.store.read().await;
        store.get(queue_id).map(f)
    }

    async fn set_paused(&self, caller: Address, queue_id: QueueId, paused: bool) -> Result<(), QueueError> {
        let op = if paused { "pause_queue" } else { "resume_queue" };
        self.commit_queue(op, queue_id, |step, _| {
            step.state().ensure_owner(&caller)?;
            step.state_mut().set_paused(paused);
            step.emit(if paused {
                KernelEvent::QueuePaused { queue_id }
            } else {
                KernelEvent::QueueResumed { queue_id }
            });
            Ok(())
        })
        .await
    }

    fn configured(queue: &Queue) -> KernelEvent {
        KernelEvent::QueueConfigured {
            queue_id: queue.id(),
            max_size: queue.max_size(),
            processing_timeout_ms: queue.processing_timeout_ms(),
        }
    }
}

#[async_trait]
impl EventQueueApi for EventQueueService {
    #[instrument(skip(self), fields(caller = %caller))]
    async fn create_queue(
        &self,
        caller: Address,
        name: String,
        max_size: usize,
        processing_timeout_ms: u64,
    ) -> Result<QueueId, QueueError> {
        self.commit_store("create_queue", |step, now| {
            let queue_id = step.state_mut().create_queue(
                caller,
                &name,
                max_size,
                processing_timeout_ms,
                now,
            )?;
            step.emit(KernelEvent::QueueCreated {
                queue_id,
                name: name.clone(),
                owner: caller,
                max_size,
            });
            Ok(queue_id)
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller))]
    async fn pause_queue(&self, caller: Address, queue_id: QueueId) -> Result<(), QueueError> {
        self.set_paused(caller, queue_id, true).await
    }

    #[instrument(skip(self), fields(caller = %caller))]
    async fn resume_queue(&self, caller: Address, queue_id: QueueId) -> Result<(), QueueError> {
        self.set_paused(caller, queue_id, false).await
    }

    #[instrument(skip(self), fields(caller = %caller))]
    async fn delete_queue(&self, caller: Address, queue_id: QueueId) -> Result<(), QueueError> {
        self.commit_store("delete_queue", |step, _| {
            let removed = step.state_mut().delete_queue(&caller, queue_id)?;
            debug!(dropped = removed.len(), "Queue events dropped");
            step.emit(KernelEvent::QueueDeleted { queue_id });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller))]
    async fn set_processing_timeout(
        &self,
        caller: Address,
        queue_id: QueueId,
        processing_timeout_ms: u64,
    ) -> Result<(), QueueError> {
        self.commit_queue("set_processing_timeout", queue_id, |step, _| {
            step.state().ensure_owner(&caller)?;
            step.state_mut().set_processing_timeout(processing_timeout_ms);
            let event = Self::configured(step.state());
            step.emit(event);
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller))]
    async fn set_max_size(&self, caller: Address, queue_id: QueueId, max_size: usize) -> Result<(), QueueError> {
        self.commit_queue("set_max_size", queue_id, |step, _| {
            step.state().ensure_owner(&caller)?;
            step.state_mut().set_max_size(max_size)?;
            let event = Self::configured(step.state());
            step.emit(event);
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, processor = %processor))]
    async fn add_processor(&self, caller: Address, queue_id: QueueId, processor: Address) -> Result<(), QueueError> {
        self.commit_queue("add_processor", queue_id, |step, _| {
            step.state().ensure_owner(&caller)?;
            step.state_mut().add_processor(processor)?;
            step.emit(KernelEvent::ProcessorAdded {
                queue_id,
                processor,
            });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller, processor = %processor))]
    async fn remove_processor(&self, caller: Address, queue_id: QueueId, processor: Address) -> Result<(), QueueError> {
        self.commit_queue("remove_processor", queue_id, |step, _| {
            step.state().ensure_owner(&caller)?;
            step.state_mut().remove_processor(processor)?;
            step.emit(KernelEvent::ProcessorRemoved {
                queue_id,
                processor,
            });
            Ok(())
        })
        .await
    }

    async fn enqueue_event(
        &self,
        caller: Address,
        event_type: EventTypeId,
        payload: Vec<u8>,
    ) -> Result<EventId, QueueError> {
        self.enqueue_event_to_queue(caller, SYSTEM_QUEUE_ID, event_type, payload)
            .await
    }

    #[instrument(skip(self, payload), fields(caller = %caller, bytes = payload.len()))]
    async fn enqueue_event_to_queue(
        &self,
        caller: Address,
        queue_id: QueueId,
        event_type: EventTypeId,
        payload: Vec<u8>,
    ) -> Result<EventId, QueueError> {
        self.commit_queue("enqueue_event", queue_id, |step, now| {
            let event_id = step.state_mut().enqueue(event_type, payload, now)?;
            step.emit(KernelEvent::EventEnqueued {
                queue_id,
                event_id,
                event_type,
                producer: caller,
            });
            Ok(event_id)
        })
        .await
    }

    async fn get_next_event(&self, queue_id: QueueId) -> Result<QueuedEvent, QueueError> {
        let now = self.clock.now();
        let store = self.store.read().await;
        let queue = store.get(queue_id)?;
        let next = queue.select_next(now)?;
        queue
            .event_at(next.position)
            .cloned()
            .ok_or(QueueError::QueueEmpty(queue_id))
    }

    #[instrument(skip(self), fields(caller = %caller))]
    async fn dequeue_event(&self, caller: Address, queue_id: QueueId) -> Result<QueuedEvent, QueueError> {
        self.commit_queue("dequeue_event", queue_id, |step, now| {
            step.state().ensure_processor(&caller)?;
            let (event, reclaimed) = step.state_mut().dequeue(caller, now)?;
            let event_id = event.id;
            step.emit(if reclaimed {
                KernelEvent::EventReclaimed {
                    queue_id,
                    event_id,
                    processor: caller,
                }
            } else {
                KernelEvent::EventDequeued {
                    queue_id,
                    event_id,
                    processor: caller,
                }
            });
            Ok(event)
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller))]
    async fn mark_event_processed(
        &self,
        caller: Address,
        queue_id: QueueId,
        event_id: EventId,
    ) -> Result<(), QueueError> {
        self.commit_queue("mark_event_processed", queue_id, |step, _| {
            step.state().ensure_processor(&caller)?;
            step.state_mut().mark_processed(event_id)?;
            step.emit(KernelEvent::EventProcessed { queue_id, event_id });
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(caller = %caller))]
    async fn release_event(&self, caller: Address, queue_id: QueueId, event_id: EventId) -> Result<(), QueueError> {
        self.commit_queue("release_event", queue_id, |step, _| {
            step.state().ensure_processor(&caller)?;
            step.state_mut().release(event_id)?;
            step.emit(KernelEvent::EventReleased { queue_id, event_id });
            Ok(())
        })
        .await
    }

    async fn get_queue(&self, queue_id: QueueId) -> Result<QueueInfo, QueueError> {
        self.read_queue(queue_id, Queue::info).await
    }

    async fn get_queue_length(&self, queue_id: QueueId) -> Result<usize, QueueError> {
        self.read_queue(queue_id, Queue::len).await
    }

    async fn get_event(&self, queue_id: QueueId, event_id: EventId) -> Result<QueuedEvent, QueueError> {
        self.read_queue(queue_id, |q| q.event(event_id).cloned())
            .await?
            .ok_or(QueueError::EventNotFound { queue_id, event_id })
    }

    async fn get_queue_events(&self, queue_id: QueueId) -> Result<Vec<QueuedEvent>, QueueError> {
        self.read_queue(queue_id, |q| q.events().to_vec()).await
    }

    async fn list_queues(&self) -> Vec<QueueInfo> {
        self.store.read().await.iter().map(Queue::info).collect()
    }
}

/// Build a standalone service whose system queue is owned by `owner`.
///
/// # Errors
///
/// Never for the default sizes; kept fallible to mirror [`EventQueueService::new`].
pub fn create_test_service(owner: Address) -> Result<EventQueueService, QueueError> {
    EventQueueService::new(
        ServiceConfig {
            system_owner: owner,
            ..ServiceConfig::default()
        },
        Arc::new(NullPublisher),
        Arc::new(SystemTimeSource),
    )
}
