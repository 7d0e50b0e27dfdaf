//! # Queue Store
//!
//! All queues, keyed by id. Queue 0 is the system queue and always exists.

use crate::domain::queue::Queue;
use crate::errors::QueueError;
use shared_types::entities::{Address, QueueId, Timestamp};
use std::collections::BTreeMap;

/// Id of the system queue.
pub const SYSTEM_QUEUE_ID: QueueId = 0;

/// Every queue managed by the service.
#[derive(Debug, Clone)]
pub struct QueueStore {
    queues: BTreeMap<QueueId, Queue>,
    next_queue_id: QueueId,
}

impl QueueStore {
    /// Creates a store holding only the system queue.
    ///
    /// # Errors
    ///
    /// `ZeroAddress` for a null owner, `InvalidParameter` for a zero capacity.
    pub fn with_system_queue(
        owner: Address,
        max_size: usize,
        processing_timeout_ms: u64,
        now: Timestamp,
    ) -> Result<Self, QueueError> {
        if owner.is_zero() {
            return Err(QueueError::ZeroAddress);
        }
        let system = Queue::new(
            SYSTEM_QUEUE_ID,
            "system",
            owner,
            max_size,
            processing_timeout_ms,
            now,
        )?;
        let mut queues = BTreeMap::new();
        queues.insert(SYSTEM_QUEUE_ID, system);
        Ok(Self {
            queues,
            next_queue_id: SYSTEM_QUEUE_ID + 1,
        })
    }

    /// Creates a queue owned by `owner` and returns its id.
    ///
    /// # Errors
    ///
    /// `ZeroAddress` for a null owner, `InvalidParameter` from [`Queue::new`].
    pub fn create_queue(
        &mut self,
        owner: Address,
        name: &str,
        max_size: usize,
        processing_timeout_ms: u64,
        now: Timestamp,
    ) -> Result<QueueId, QueueError> {
        if owner.is_zero() {
            return Err(QueueError::ZeroAddress);
        }
        let id = self.next_queue_id;
        let queue = Queue::new(id, name, owner, max_size, processing_timeout_ms, now)?;
        self.queues.insert(id, queue);
        self.next_queue_id += 1;
        Ok(id)
    }

    /// Deletes a queue and its events.
    ///
    /// # Errors
    ///
    /// `SystemQueueProtected` for queue 0, `QueueNotFound`, `NotQueueOwner`.
    pub fn delete_queue(&mut self, caller: &Address, id: QueueId) -> Result<Queue, QueueError> {
        if id == SYSTEM_QUEUE_ID {
            return Err(QueueError::SystemQueueProtected);
        }
        self.get(id)?.ensure_owner(caller)?;
        self.queues.remove(&id).ok_or(QueueError::QueueNotFound(id))
    }

    /// Queue by id.
    pub fn get(&self, id: QueueId) -> Result<&Queue, QueueError> {
        self.queues.get(&id).ok_or(QueueError::QueueNotFound(id))
    }

    /// Mutable queue by id.
    pub fn get_mut(&mut self, id: QueueId) -> Result<&mut Queue, QueueError> {
        self.queues.get_mut(&id).ok_or(QueueError::QueueNotFound(id))
    }

    /// Queues in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Queue> {
        self.queues.values()
    }

    /// Number of queues, the system queue included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Always false: the system queue exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
