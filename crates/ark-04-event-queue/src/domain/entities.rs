//! # Queue Entities

use serde::{Deserialize, Serialize};
use shared_types::entities::{Address, EventId, EventTypeId, QueueId, Timestamp};

/// An event held by a queue.
///
/// ```text
/// [pending] ──dequeue──→ [processing] ──mark_processed──→ (removed)
///     ↑                       │
///     └──────release──────────┘
///                  processing + timeout elapsed ──dequeue──→ [processing] (reclaimed)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedEvent {
    /// Per-queue id, never reused.
    pub id: EventId,
    pub event_type: EventTypeId,
    pub payload: Vec<u8>,
    pub enqueued_at: Timestamp,
    pub is_processing: bool,
    /// Set when handed to a processor; cleared on release.
    pub processing_started_at: Option<Timestamp>,
    /// Last processor the event was handed to.
    pub processor: Option<Address>,
    /// Number of times the event has been handed out.
    pub attempts: u32,
    pub is_processed: bool,
}

impl QueuedEvent {
    /// A fresh pending event.
    #[must_use]
    pub fn new(id: EventId, event_type: EventTypeId, payload: Vec<u8>, now: Timestamp) -> Self {
        Self {
            id,
            event_type,
            payload,
            enqueued_at: now,
            is_processing: false,
            processing_started_at: None,
            processor: None,
            attempts: 0,
            is_processed: false,
        }
    }

    /// Returns true if the event is processing and its timeout has elapsed.
    #[must_use]
    pub fn is_stale(&self, timeout_ms: u64, now: Timestamp) -> bool {
        match (self.is_processing, self.processing_started_at) {
            (true, Some(started)) => started.saturating_add(timeout_ms) <= now,
            _ => false,
        }
    }
}

/// Result of the selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextEvent {
    /// Storage position of the selected event.
    pub position: usize,
    /// True if the event was processing and is being reclaimed.
    pub reclaimed: bool,
}

/// Read-only view of a queue without its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    pub id: QueueId,
    pub name: String,
    pub owner: Address,
    pub max_size: usize,
    pub paused: bool,
    pub created_at: Timestamp,
    pub processing_timeout_ms: u64,
    pub next_event_id: EventId,
    pub length: usize,
    pub processors: Vec<Address>,
}
