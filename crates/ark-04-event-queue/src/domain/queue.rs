//! # Queue
//!
//! One bounded queue. Events stay in place while processing and leave only
//! when marked processed, by swapping with the last event and truncating.
//! Storage order is therefore not enqueue order once anything has left.

use crate::domain::entities::{NextEvent, QueueInfo, QueuedEvent};
use crate::errors::QueueError;
use shared_types::entities::{Address, EventId, EventTypeId, QueueId, Timestamp};
use std::collections::HashMap;

/// A capacity-bounded queue with its processors and active events.
#[derive(Debug, Clone)]
pub struct Queue {
    id: QueueId,
    name: String,
    owner: Address,
    max_size: usize,
    paused: bool,
    created_at: Timestamp,
    processing_timeout_ms: u64,
    next_event_id: EventId,
    /// Explicit processors in authorization order. The owner is implicit.
    processors: Vec<Address>,
    events: Vec<QueuedEvent>,
    /// Event id -> position in `events`.
    index: HashMap<EventId, usize>,
}

impl Queue {
    /// Creates an empty, running queue.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for an empty name or a zero capacity.
    pub fn new(
        id: QueueId,
        name: impl Into<String>,
        owner: Address,
        max_size: usize,
        processing_timeout_ms: u64,
        now: Timestamp,
    ) -> Result<Self, QueueError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(QueueError::InvalidParameter(
                "queue name must not be empty".to_string(),
            ));
        }
        if max_size == 0 {
            return Err(QueueError::InvalidParameter(
                "max_size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            id,
            name,
            owner,
            max_size,
            paused: false,
            created_at: now,
            processing_timeout_ms,
            next_event_id: 0,
            processors: Vec::new(),
            events: Vec::new(),
            index: HashMap::new(),
        })
    }

    // =========================================================================
    // OWNERSHIP AND PROCESSORS
    // =========================================================================

    /// Queue id.
    #[must_use]
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Queue owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Fails with `NotQueueOwner` unless `caller` owns the queue.
    pub fn ensure_owner(&self, caller: &Address) -> Result<(), QueueError> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(QueueError::NotQueueOwner {
                queue_id: self.id,
                caller: *caller,
            })
        }
    }

    /// Returns true for the owner and explicit processors.
    #[must_use]
    pub fn is_processor(&self, account: &Address) -> bool {
        *account == self.owner || self.processors.contains(account)
    }

    /// Fails with `NotProcessor` unless `caller` may process.
    pub fn ensure_processor(&self, caller: &Address) -> Result<(), QueueError> {
        if self.is_processor(caller) {
            Ok(())
        } else {
            Err(QueueError::NotProcessor {
                queue_id: self.id,
                caller: *caller,
            })
        }
    }

    /// Authorizes an explicit processor.
    ///
    /// # Errors
    ///
    /// `ZeroAddress`, or `ProcessorAlreadyAuthorized` if the account already
    /// processes (the owner included).
    pub fn add_processor(&mut self, processor: Address) -> Result<(), QueueError> {
        if processor.is_zero() {
            return Err(QueueError::ZeroAddress);
        }
        if self.is_processor(&processor) {
            return Err(QueueError::ProcessorAlreadyAuthorized {
                queue_id: self.id,
                processor,
            });
        }
        self.processors.push(processor);
        Ok(())
    }

    /// Removes an explicit processor.
    ///
    /// # Errors
    ///
    /// `ProcessorNotFound` if the account is not an explicit processor.
    pub fn remove_processor(&mut self, processor: Address) -> Result<(), QueueError> {
        let position = self
            .processors
            .iter()
            .position(|p| *p == processor)
            .ok_or(QueueError::ProcessorNotFound {
                queue_id: self.id,
                processor,
            })?;
        self.processors.remove(position);
        Ok(())
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    /// Returns true if the queue is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Sets the paused flag.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Current capacity.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Current processing timeout.
    #[must_use]
    pub fn processing_timeout_ms(&self) -> u64 {
        self.processing_timeout_ms
    }

    /// Changes the capacity.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for zero or a value below the current length.
    pub fn set_max_size(&mut self, max_size: usize) -> Result<(), QueueError> {
        if max_size == 0 || max_size < self.events.len() {
            return Err(QueueError::InvalidParameter(format!(
                "max_size {max_size} must be at least max(1, {})",
                self.events.len()
            )));
        }
        self.max_size = max_size;
        Ok(())
    }

    /// Changes the processing timeout. Applies to events already processing.
    pub fn set_processing_timeout(&mut self, timeout_ms: u64) {
        self.processing_timeout_ms = timeout_ms;
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Appends an event and returns its id.
    ///
    /// # Errors
    ///
    /// `QueuePaused`, or `QueueFull` once `len == max_size`.
    pub fn enqueue(
        &mut self,
        event_type: EventTypeId,
        payload: Vec<u8>,
        now: Timestamp,
    ) -> Result<EventId, QueueError> {
        if self.paused {
            return Err(QueueError::QueuePaused(self.id));
        }
        if self.events.len() >= self.max_size {
            return Err(QueueError::QueueFull {
                queue_id: self.id,
                max_size: self.max_size,
            });
        }

        let id = self.next_event_id;
        self.next_event_id += 1;
        self.index.insert(id, self.events.len());
        self.events
            .push(QueuedEvent::new(id, event_type, payload, now));
        Ok(id)
    }

    /// Applies the selection rule without changing anything.
    ///
    /// The first event in storage order that is not processing wins. Failing
    /// that, the processing event with the oldest start whose timeout has
    /// elapsed is reclaimed.
    ///
    /// # Errors
    ///
    /// `QueueEmpty` if neither kind of event exists.
    pub fn select_next(&self, now: Timestamp) -> Result<NextEvent, QueueError> {
        if let Some(position) = self.events.iter().position(|e| !e.is_processing) {
            return Ok(NextEvent {
                position,
                reclaimed: false,
            });
        }

        self.events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_stale(self.processing_timeout_ms, now))
            .min_by_key(|(_, e)| e.processing_started_at)
            .map(|(position, _)| NextEvent {
                position,
                reclaimed: true,
            })
            .ok_or(QueueError::QueueEmpty(self.id))
    }

    /// Hands the selected event to `processor` and returns a copy.
    ///
    /// # Errors
    ///
    /// `QueuePaused`, or `QueueEmpty` from the selection rule.
    pub fn dequeue(
        &mut self,
        processor: Address,
        now: Timestamp,
    ) -> Result<(QueuedEvent, bool), QueueError> {
        if self.paused {
            return Err(QueueError::QueuePaused(self.id));
        }
        let next = self.select_next(now)?;
        let event = &mut self.events[next.position];
        event.is_processing = true;
        event.processing_started_at = Some(now);
        event.processor = Some(processor);
        event.attempts = event.attempts.saturating_add(1);
        Ok((event.clone(), next.reclaimed))
    }

    /// Marks a processing event done and removes it (swap with last, pop).
    ///
    /// # Errors
    ///
    /// `EventNotFound`, or `EventNotProcessing` if never dequeued.
    pub fn mark_processed(&mut self, event_id: EventId) -> Result<QueuedEvent, QueueError> {
        let position = self.position_of(event_id)?;
        if !self.events[position].is_processing {
            return Err(QueueError::EventNotProcessing {
                queue_id: self.id,
                event_id,
            });
        }

        let mut removed = self.events.swap_remove(position);
        self.index.remove(&event_id);
        if let Some(moved) = self.events.get(position) {
            self.index.insert(moved.id, position);
        }
        removed.is_processed = true;
        removed.is_processing = false;
        Ok(removed)
    }

    /// Returns a processing event to pending.
    ///
    /// # Errors
    ///
    /// `EventNotFound`, or `EventNotProcessing` if it is not processing.
    pub fn release(&mut self, event_id: EventId) -> Result<(), QueueError> {
        let position = self.position_of(event_id)?;
        let event = &mut self.events[position];
        if !event.is_processing {
            return Err(QueueError::EventNotProcessing {
                queue_id: self.id,
                event_id,
            });
        }
        event.is_processing = false;
        event.processing_started_at = None;
        Ok(())
    }

    fn position_of(&self, event_id: EventId) -> Result<usize, QueueError> {
        self.index
            .get(&event_id)
            .copied()
            .ok_or(QueueError::EventNotFound {
                queue_id: self.id,
                event_id,
            })
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Number of active events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no event is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event by id.
    #[must_use]
    pub fn event(&self, event_id: EventId) -> Option<&QueuedEvent> {
        self.index.get(&event_id).map(|&p| &self.events[p])
    }

    /// Event at a storage position.
    #[must_use]
    pub fn event_at(&self, position: usize) -> Option<&QueuedEvent> {
        self.events.get(position)
    }

    /// Active events in storage order.
    #[must_use]
    pub fn events(&self) -> &[QueuedEvent] {
        &self.events
    }

    /// Returns true if every index entry points at the event with that id.
    #[must_use]
    pub fn index_is_consistent(&self) -> bool {
        self.index.len() == self.events.len()
            && self
                .events
                .iter()
                .enumerate()
                .all(|(p, e)| self.index.get(&e.id) == Some(&p))
    }

    /// Read-only view without events.
    #[must_use]
    pub fn info(&self) -> QueueInfo {
        QueueInfo {
            id: self.id,
            name: self.name.clone(),
            owner: self.owner,
            max_size: self.max_size,
            paused: self.paused,
            created_at: self.created_at,
            processing_timeout_ms: self.processing_timeout_ms,
            next_event_id: self.next_event_id,
            length: self.events.len(),
            processors: self.processors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OWNER: Address = Address::from_low_u16(0x0A);
    const WORKER: Address = Address::from_low_u16(0x0B);
    const TIMEOUT: u64 = 1_000;

    fn kind() -> EventTypeId {
        EventTypeId::of_name("TEST")
    }

    fn queue(max_size: usize) -> Queue {
        Queue::new(1, "jobs", OWNER, max_size, TIMEOUT, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_parameters() {
        assert!(matches!(
            Queue::new(1, "", OWNER, 5, TIMEOUT, 0),
            Err(QueueError::InvalidParameter(_))
        ));
        assert!(matches!(
            Queue::new(1, "jobs", OWNER, 0, TIMEOUT, 0),
            Err(QueueError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_capacity_and_ids() {
        let mut q = queue(2);
        assert_eq!(q.enqueue(kind(), vec![1], 0).unwrap(), 0);
        assert_eq!(q.enqueue(kind(), vec![2], 0).unwrap(), 1);
        assert_eq!(
            q.enqueue(kind(), vec![3], 0),
            Err(QueueError::QueueFull {
                queue_id: 1,
                max_size: 2
            })
        );

        q.dequeue(OWNER, 10).unwrap();
        q.mark_processed(0).unwrap();
        assert_eq!(q.len(), 1);
        assert_eq!(q.enqueue(kind(), vec![3], 20).unwrap(), 2);
    }

    #[test]
    fn test_paused_refuses() {
        let mut q = queue(2);
        q.enqueue(kind(), vec![], 0).unwrap();
        q.set_paused(true);
        assert_eq!(q.enqueue(kind(), vec![], 0), Err(QueueError::QueuePaused(1)));
        assert_eq!(q.dequeue(OWNER, 0).map(|_| ()), Err(QueueError::QueuePaused(1)));
        assert!(q.select_next(0).is_ok());
    }

    #[test]
    fn test_selection_prefers_pending() {
        let mut q = queue(3);
        q.enqueue(kind(), vec![], 0).unwrap();
        q.enqueue(kind(), vec![], 0).unwrap();

        let (first, reclaimed) = q.dequeue(OWNER, 100).unwrap();
        assert_eq!(first.id, 0);
        assert!(!reclaimed);

        // Event 0 is stale but event 1 is still pending.
        let next = q.select_next(100 + TIMEOUT).unwrap();
        assert_eq!(q.event_at(next.position).unwrap().id, 1);
        assert!(!next.reclaimed);
    }

    #[test]
    fn test_reclaim_oldest_stale() {
        let mut q = queue(3);
        for _ in 0..3 {
            q.enqueue(kind(), vec![], 0).unwrap();
        }
        q.dequeue(OWNER, 300).unwrap(); // id 0
        q.dequeue(OWNER, 100).unwrap(); // id 1, oldest start
        q.dequeue(OWNER, 200).unwrap(); // id 2

        assert_eq!(q.select_next(300), Err(QueueError::QueueEmpty(1)));
        assert_eq!(q.select_next(100 + TIMEOUT - 1), Err(QueueError::QueueEmpty(1)));

        let (event, reclaimed) = q.dequeue(WORKER, 100 + TIMEOUT).unwrap();
        assert_eq!(event.id, 1);
        assert!(reclaimed);
        assert_eq!(event.attempts, 2);
        assert_eq!(event.processor, Some(WORKER));
        assert_eq!(event.processing_started_at, Some(100 + TIMEOUT));
    }

    #[test]
    fn test_processed_never_returns() {
        let mut q = queue(2);
        q.enqueue(kind(), vec![], 0).unwrap();
        q.dequeue(OWNER, 0).unwrap();
        q.mark_processed(0).unwrap();

        assert_eq!(q.select_next(u64::MAX), Err(QueueError::QueueEmpty(1)));
        assert_eq!(
            q.mark_processed(0),
            Err(QueueError::EventNotFound {
                queue_id: 1,
                event_id: 0
            })
        );
    }

    #[test]
    fn test_mark_requires_processing() {
        let mut q = queue(2);
        q.enqueue(kind(), vec![], 0).unwrap();
        assert_eq!(
            q.mark_processed(0),
            Err(QueueError::EventNotProcessing {
                queue_id: 1,
                event_id: 0
            })
        );
    }

    #[test]
    fn test_swap_remove_reorders_and_reindexes() {
        let mut q = queue(4);
        for _ in 0..4 {
            q.enqueue(kind(), vec![], 0).unwrap();
        }
        q.dequeue(OWNER, 0).unwrap(); // id 0
        q.mark_processed(0).unwrap();

        let ids: Vec<EventId> = q.events().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(q.index_is_consistent());
        assert_eq!(q.event(3).unwrap().id, 3);
    }

    #[test]
    fn test_release_returns_to_pending() {
        let mut q = queue(2);
        q.enqueue(kind(), vec![], 0).unwrap();
        q.dequeue(OWNER, 0).unwrap();
        q.release(0).unwrap();

        let event = q.event(0).unwrap();
        assert!(!event.is_processing);
        assert_eq!(event.processing_started_at, None);
        assert_eq!(
            q.release(0),
            Err(QueueError::EventNotProcessing {
                queue_id: 1,
                event_id: 0
            })
        );
        assert_eq!(q.select_next(0).unwrap().position, 0);
    }

    #[test]
    fn test_processors() {
        let mut q = queue(1);
        assert!(q.is_processor(&OWNER));
        assert!(!q.is_processor(&WORKER));

        q.add_processor(WORKER).unwrap();
        assert!(q.is_processor(&WORKER));
        assert!(matches!(
            q.add_processor(WORKER),
            Err(QueueError::ProcessorAlreadyAuthorized { .. })
        ));
        assert!(matches!(
            q.add_processor(OWNER),
            Err(QueueError::ProcessorAlreadyAuthorized { .. })
        ));
        assert_eq!(q.add_processor(Address::ZERO), Err(QueueError::ZeroAddress));

        q.remove_processor(WORKER).unwrap();
        assert!(matches!(
            q.remove_processor(WORKER),
            Err(QueueError::ProcessorNotFound { .. })
        ));
    }

    #[test]
    fn test_set_max_size_bounds() {
        let mut q = queue(3);
        q.enqueue(kind(), vec![], 0).unwrap();
        q.enqueue(kind(), vec![], 0).unwrap();
        assert!(q.set_max_size(1).is_err());
        assert!(q.set_max_size(0).is_err());
        q.set_max_size(2).unwrap();
        assert_eq!(q.max_size(), 2);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Enqueue,
        Dequeue,
        MarkAt(usize),
        Advance(u64),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            Just(Step::Enqueue),
            Just(Step::Dequeue),
            (0usize..8).prop_map(Step::MarkAt),
            (0u64..2_000).prop_map(Step::Advance),
        ]
    }

    proptest! {
        #[test]
        fn prop_length_bounded_and_index_consistent(
            max_size in 1usize..6,
            steps in prop::collection::vec(step_strategy(), 0..80),
        ) {
            let mut q = queue(max_size);
            let mut now = 0u64;
            let mut processed = Vec::new();
            let mut enqueued = 0u64;

            for step in steps {
                match step {
                    Step::Enqueue => {
                        if let Ok(id) = q.enqueue(kind(), vec![], now) {
                            prop_assert_eq!(id, enqueued);
                            enqueued += 1;
                        }
                    }
                    Step::Dequeue => {
                        if let Ok((event, _)) = q.dequeue(OWNER, now) {
                            prop_assert!(!processed.contains(&event.id));
                        }
                    }
                    Step::MarkAt(position) => {
                        if let Some(id) = q.event_at(position).map(|e| e.id) {
                            if q.mark_processed(id).is_ok() {
                                processed.push(id);
                            }
                        }
                    }
                    Step::Advance(ms) => now += ms,
                }
                prop_assert!(q.len() <= q.max_size());
                prop_assert!(q.index_is_consistent());
            }
            prop_assert_eq!(q.len() + processed.len(), enqueued as usize);
        }
    }
}
