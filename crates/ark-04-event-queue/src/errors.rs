//! # Error Types

use shared_types::entities::{Address, EventId, QueueId};
use thiserror::Error;

/// Errors raised by the event queue manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue not found: {0}")]
    QueueNotFound(QueueId),

    #[error("caller {caller} does not own queue {queue_id}")]
    NotQueueOwner { queue_id: QueueId, caller: Address },

    #[error("caller {caller} is not a processor of queue {queue_id}")]
    NotProcessor { queue_id: QueueId, caller: Address },

    #[error("queue {queue_id} is full ({max_size} events)")]
    QueueFull { queue_id: QueueId, max_size: usize },

    /// No pending event and no processing event past its timeout.
    #[error("queue {0} has no available event")]
    QueueEmpty(QueueId),

    #[error("queue {0} is paused")]
    QueuePaused(QueueId),

    #[error("event {event_id} not found in queue {queue_id}")]
    EventNotFound { queue_id: QueueId, event_id: EventId },

    /// The event was never dequeued (or was released).
    #[error("event {event_id} in queue {queue_id} is not being processed")]
    EventNotProcessing { queue_id: QueueId, event_id: EventId },

    /// Queue 0 cannot be deleted.
    #[error("the system queue cannot be deleted")]
    SystemQueueProtected,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{processor} is already a processor of queue {queue_id}")]
    ProcessorAlreadyAuthorized { queue_id: QueueId, processor: Address },

    #[error("{processor} is not a registered processor of queue {queue_id}")]
    ProcessorNotFound { queue_id: QueueId, processor: Address },

    #[error("zero address")]
    ZeroAddress,
}

impl QueueError {
    /// Short snake_case kind, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QueueNotFound(_) => "queue_not_found",
            Self::NotQueueOwner { .. } => "not_queue_owner",
            Self::NotProcessor { .. } => "not_processor",
            Self::QueueFull { .. } => "queue_full",
            Self::QueueEmpty(_) => "queue_empty",
            Self::QueuePaused(_) => "queue_paused",
            Self::EventNotFound { .. } => "event_not_found",
            Self::EventNotProcessing { .. } => "event_not_processing",
            Self::SystemQueueProtected => "system_queue_protected",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::ProcessorAlreadyAuthorized { .. } => "processor_already_authorized",
            Self::ProcessorNotFound { .. } => "processor_not_found",
            Self::ZeroAddress => "zero_address",
        }
    }
}
