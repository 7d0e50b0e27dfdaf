//! # Driving Ports (API - Inbound)
//!
//! Queue lifecycle and configuration are owner-only. Dequeue, mark and
//! release are processor-only (the owner always processes). Enqueue and
//! reads are open.

use crate::domain::entities::{QueueInfo, QueuedEvent};
use crate::errors::QueueError;
use async_trait::async_trait;
use shared_types::entities::{Address, EventId, EventTypeId, QueueId};

/// Primary API for the event queue manager.
#[async_trait]
pub trait EventQueueApi: Send + Sync {
    /// Create a queue owned by `caller`.
    async fn create_queue(
        &self,
        caller: Address,
        name: String,
        max_size: usize,
        processing_timeout_ms: u64,
    ) -> Result<QueueId, QueueError>;

    /// Stop accepting and handing out events.
    async fn pause_queue(&self, caller: Address, queue_id: QueueId) -> Result<(), QueueError>;

    /// Resume a paused queue.
    async fn resume_queue(&self, caller: Address, queue_id: QueueId) -> Result<(), QueueError>;

    /// Delete a queue and drop its events. Queue 0 is protected.
    async fn delete_queue(&self, caller: Address, queue_id: QueueId) -> Result<(), QueueError>;

    /// Change the processing timeout.
    async fn set_processing_timeout(
        &self,
        caller: Address,
        queue_id: QueueId,
        processing_timeout_ms: u64,
    ) -> Result<(), QueueError>;

    /// Change the capacity.
    async fn set_max_size(&self, caller: Address, queue_id: QueueId, max_size: usize) -> Result<(), QueueError>;

    /// Authorize a processor.
    async fn add_processor(&self, caller: Address, queue_id: QueueId, processor: Address) -> Result<(), QueueError>;

    /// Revoke a processor.
    async fn remove_processor(&self, caller: Address, queue_id: QueueId, processor: Address) -> Result<(), QueueError>;

    /// Append to the system queue.
    async fn enqueue_event(
        &self,
        caller: Address,
        event_type: EventTypeId,
        payload: Vec<u8>,
    ) -> Result<EventId, QueueError>;

    /// Append to a specific queue.
    async fn enqueue_event_to_queue(
        &self,
        caller: Address,
        queue_id: QueueId,
        event_type: EventTypeId,
        payload: Vec<u8>,
    ) -> Result<EventId, QueueError>;

    /// The event `dequeue_event` would hand out now, without taking it.
    async fn get_next_event(&self, queue_id: QueueId) -> Result<QueuedEvent, QueueError>;

    /// Take the next event. It stays in the queue, marked processing.
    async fn dequeue_event(&self, caller: Address, queue_id: QueueId) -> Result<QueuedEvent, QueueError>;

    /// Finish a processing event and remove it.
    async fn mark_event_processed(
        &self,
        caller: Address,
        queue_id: QueueId,
        event_id: EventId,
    ) -> Result<(), QueueError>;

    /// Return a processing event to pending.
    async fn release_event(&self, caller: Address, queue_id: QueueId, event_id: EventId) -> Result<(), QueueError>;

    /// Queue metadata.
    async fn get_queue(&self, queue_id: QueueId) -> Result<QueueInfo, QueueError>;

    /// Number of active events.
    async fn get_queue_length(&self, queue_id: QueueId) -> Result<usize, QueueError>;

    /// One active event.
    async fn get_event(&self, queue_id: QueueId, event_id: EventId) -> Result<QueuedEvent, QueueError>;

    /// Active events in storage order.
    async fn get_queue_events(&self, queue_id: QueueId) -> Result<Vec<QueuedEvent>, QueueError>;

    /// Every queue in id order.
    async fn list_queues(&self) -> Vec<QueueInfo>;
}
