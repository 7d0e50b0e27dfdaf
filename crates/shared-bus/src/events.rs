//! # Kernel Events
//!
//! Every mutating kernel operation publishes one of these after it commits.
//! The payloads mirror the call arguments so off-chain observers can rebuild
//! state from the event stream alone.

use serde::{Deserialize, Serialize};
use shared_types::entities::{
    Address, EventId, EventTypeId, Keycode, QueueId, RoleId, RuleId, Selector,
};

/// Numeric identifiers of the kernel subsystems.
pub mod subsystem_ids {
    /// Module registry.
    pub const MODULE_REGISTRY: u8 = 1;
    /// Module authority (permissions and roles).
    pub const MODULE_AUTHORITY: u8 = 2;
    /// Module access validator.
    pub const ACCESS_VALIDATOR: u8 = 3;
    /// Event queue manager.
    pub const EVENT_QUEUE: u8 = 4;
    /// Event subscription manager.
    pub const EVENT_SUBSCRIPTIONS: u8 = 5;
    /// Kernel runtime (gateway, wiring).
    pub const KERNEL_RUNTIME: u8 = 0;
}

/// All events that can be published to the kernel bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelEvent {
    // =========================================================================
    // SUBSYSTEM 1: MODULE REGISTRY
    // =========================================================================
    /// A module was registered for the first time.
    ModuleRegistered {
        keycode: Keycode,
        implementation: Address,
    },

    /// A module implementation was replaced.
    ModuleUpgraded {
        keycode: Keycode,
        previous: Address,
        implementation: Address,
        version: u32,
    },

    /// A dependency link was added.
    DependencyRegistered {
        keycode: Keycode,
        dependency: Keycode,
    },

    /// A dependency link was removed.
    DependencyRemoved {
        keycode: Keycode,
        dependency: Keycode,
    },

    // =========================================================================
    // SUBSYSTEM 2: MODULE AUTHORITY
    // =========================================================================
    /// A (module, account, selector) permission was set.
    PermissionGranted {
        module: Keycode,
        account: Address,
        selector: Selector,
    },

    /// A (module, account, selector) permission was cleared.
    PermissionRevoked {
        module: Keycode,
        account: Address,
        selector: Selector,
    },

    /// A role was declared.
    RoleCreated { role: RoleId },

    /// A role and all its assignments were dropped.
    RoleRemoved { role: RoleId },

    /// An account received a role.
    RoleGranted { role: RoleId, account: Address },

    /// An account lost a role.
    RoleRevoked { role: RoleId, account: Address },

    // =========================================================================
    // SUBSYSTEM 3: ACCESS VALIDATOR
    // =========================================================================
    /// A validation rule was attached to (module, selector).
    RuleAdded {
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
        priority: u32,
    },

    /// A rule was switched on or off.
    RuleStatusChanged {
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
        active: bool,
    },

    /// A rule was detached.
    RuleRemoved {
        module: Keycode,
        selector: Selector,
        rule_id: RuleId,
    },

    /// An access check ran. `total` is the validator-wide call count.
    AccessValidated {
        account: Address,
        module: Keycode,
        selector: Selector,
        total: u64,
    },

    // =========================================================================
    // SUBSYSTEM 4: EVENT QUEUE
    // =========================================================================
    /// A queue was created.
    QueueCreated {
        queue_id: QueueId,
        name: String,
        owner: Address,
        max_size: usize,
    },

    /// A queue stopped accepting and handing out events.
    QueuePaused { queue_id: QueueId },

    /// A paused queue resumed.
    QueueResumed { queue_id: QueueId },

    /// A queue and its pending events were deleted.
    QueueDeleted { queue_id: QueueId },

    /// Capacity or processing timeout changed.
    QueueConfigured {
        queue_id: QueueId,
        max_size: usize,
        processing_timeout_ms: u64,
    },

    /// An account may now dequeue from the queue.
    ProcessorAdded { queue_id: QueueId, processor: Address },

    /// An account may no longer dequeue from the queue.
    ProcessorRemoved { queue_id: QueueId, processor: Address },

    /// An event was appended.
    EventEnqueued {
        queue_id: QueueId,
        event_id: EventId,
        event_type: EventTypeId,
        producer: Address,
    },

    /// A pending event was handed to a processor.
    EventDequeued {
        queue_id: QueueId,
        event_id: EventId,
        processor: Address,
    },

    /// A stuck event was handed to a processor after its timeout elapsed.
    EventReclaimed {
        queue_id: QueueId,
        event_id: EventId,
        processor: Address,
    },

    /// A processing event was returned to pending.
    EventReleased { queue_id: QueueId, event_id: EventId },

    /// An event finished and left the queue.
    EventProcessed { queue_id: QueueId, event_id: EventId },

    // =========================================================================
    // SUBSYSTEM 5: EVENT SUBSCRIPTIONS
    // =========================================================================
    /// An event type was registered.
    EventTypeRegistered {
        event_type: EventTypeId,
        name: String,
        max_subscribers: u32,
    },

    /// An event type's subscriber cap changed.
    EventTypeUpdated {
        event_type: EventTypeId,
        max_subscribers: u32,
    },

    /// An account may now register event types and notify.
    AuthorizedCallerAdded { account: Address },

    /// An account lost event-type rights.
    AuthorizedCallerRemoved { account: Address },

    /// A fresh subscription was created.
    Subscribed {
        event_type: EventTypeId,
        subscriber: Address,
    },

    /// A subscription was deleted.
    Unsubscribed {
        event_type: EventTypeId,
        subscriber: Address,
    },

    /// A subscription stopped receiving notifications.
    SubscriptionPaused {
        event_type: EventTypeId,
        subscriber: Address,
    },

    /// A paused subscription resumed.
    SubscriptionResumed {
        event_type: EventTypeId,
        subscriber: Address,
    },

    /// Active subscribers of an event type were notified.
    SubscribersNotified {
        event_type: EventTypeId,
        subscribers: Vec<Address>,
        payload: Vec<u8>,
    },
}

impl KernelEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ModuleRegistered { .. }
            | Self::ModuleUpgraded { .. }
            | Self::DependencyRegistered { .. }
            | Self::DependencyRemoved { .. } => EventTopic::Registry,
            Self::PermissionGranted { .. }
            | Self::PermissionRevoked { .. }
            | Self::RoleCreated { .. }
            | Self::RoleRemoved { .. }
            | Self::RoleGranted { .. }
            | Self::RoleRevoked { .. } => EventTopic::Authority,
            Self::RuleAdded { .. }
            | Self::RuleStatusChanged { .. }
            | Self::RuleRemoved { .. }
            | Self::AccessValidated { .. } => EventTopic::Validation,
            Self::QueueCreated { .. }
            | Self::QueuePaused { .. }
            | Self::QueueResumed { .. }
            | Self::QueueDeleted { .. }
            | Self::QueueConfigured { .. }
            | Self::ProcessorAdded { .. }
            | Self::ProcessorRemoved { .. }
            | Self::EventEnqueued { .. }
            | Self::EventDequeued { .. }
            | Self::EventReclaimed { .. }
            | Self::EventReleased { .. }
            | Self::EventProcessed { .. } => EventTopic::EventQueue,
            Self::EventTypeRegistered { .. }
            | Self::EventTypeUpdated { .. }
            | Self::AuthorizedCallerAdded { .. }
            | Self::AuthorizedCallerRemoved { .. }
            | Self::Subscribed { .. }
            | Self::Unsubscribed { .. }
            | Self::SubscriptionPaused { .. }
            | Self::SubscriptionResumed { .. }
            | Self::SubscribersNotified { .. } => EventTopic::Subscriptions,
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self.topic() {
            EventTopic::Registry => subsystem_ids::MODULE_REGISTRY,
            EventTopic::Authority => subsystem_ids::MODULE_AUTHORITY,
            EventTopic::Validation => subsystem_ids::ACCESS_VALIDATOR,
            EventTopic::EventQueue => subsystem_ids::EVENT_QUEUE,
            EventTopic::Subscriptions => subsystem_ids::EVENT_SUBSCRIPTIONS,
            EventTopic::All => subsystem_ids::KERNEL_RUNTIME,
        }
    }

    /// Short event name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModuleRegistered { .. } => "ModuleRegistered",
            Self::ModuleUpgraded { .. } => "ModuleUpgraded",
            Self::DependencyRegistered { .. } => "DependencyRegistered",
            Self::DependencyRemoved { .. } => "DependencyRemoved",
            Self::PermissionGranted { .. } => "PermissionGranted",
            Self::PermissionRevoked { .. } => "PermissionRevoked",
            Self::RoleCreated { .. } => "RoleCreated",
            Self::RoleRemoved { .. } => "RoleRemoved",
            Self::RoleGranted { .. } => "RoleGranted",
            Self::RoleRevoked { .. } => "RoleRevoked",
            Self::RuleAdded { .. } => "RuleAdded",
            Self::RuleStatusChanged { .. } => "RuleStatusChanged",
            Self::RuleRemoved { .. } => "RuleRemoved",
            Self::AccessValidated { .. } => "AccessValidated",
            Self::QueueCreated { .. } => "QueueCreated",
            Self::QueuePaused { .. } => "QueuePaused",
            Self::QueueResumed { .. } => "QueueResumed",
            Self::QueueDeleted { .. } => "QueueDeleted",
            Self::QueueConfigured { .. } => "QueueConfigured",
            Self::ProcessorAdded { .. } => "ProcessorAdded",
            Self::ProcessorRemoved { .. } => "ProcessorRemoved",
            Self::EventEnqueued { .. } => "EventEnqueued",
            Self::EventDequeued { .. } => "EventDequeued",
            Self::EventReclaimed { .. } => "EventReclaimed",
            Self::EventReleased { .. } => "EventReleased",
            Self::EventProcessed { .. } => "EventProcessed",
            Self::EventTypeRegistered { .. } => "EventTypeRegistered",
            Self::EventTypeUpdated { .. } => "EventTypeUpdated",
            Self::AuthorizedCallerAdded { .. } => "AuthorizedCallerAdded",
            Self::AuthorizedCallerRemoved { .. } => "AuthorizedCallerRemoved",
            Self::Subscribed { .. } => "Subscribed",
            Self::Unsubscribed { .. } => "Unsubscribed",
            Self::SubscriptionPaused { .. } => "SubscriptionPaused",
            Self::SubscriptionResumed { .. } => "SubscriptionResumed",
            Self::SubscribersNotified { .. } => "SubscribersNotified",
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Subsystem 1 events.
    Registry,
    /// Subsystem 2 events.
    Authority,
    /// Subsystem 3 events.
    Validation,
    /// Subsystem 4 events.
    EventQueue,
    /// Subsystem 5 events.
    Subscriptions,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source subsystems to include. Empty means all sources.
    pub source_subsystems: Vec<u8>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_subsystems: Vec::new(),
        }
    }

    /// Create a filter for events from specific subsystems.
    #[must_use]
    pub fn from_subsystems(subsystems: Vec<u8>) -> Self {
        Self {
            topics: Vec::new(),
            source_subsystems: subsystems,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &KernelEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_subsystems.is_empty()
            || self.source_subsystems.contains(&event.source_subsystem());

        topic_match && source_match
    }
}
