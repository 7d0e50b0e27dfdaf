//! # Metrics Adapter
//!
//! Subscribes to the kernel bus and turns committed events into Prometheus
//! samples. Subsystems stay unaware of metrics.

use ark_telemetry::{
    ACCESS_VALIDATIONS, AUTHORITY_CHANGES, EVENT_BUS_MESSAGES, NOTIFICATIONS, QUEUE_DEPTH,
    QUEUE_EVENTS, REGISTERED_MODULES,
};
use parking_lot::Mutex;
use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, KernelEvent};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info};

fn topic_label(topic: EventTopic) -> &'static str {
    match topic {
        EventTopic::Registry => "registry",
        EventTopic::Authority => "authority",
        EventTopic::Validation => "validation",
        EventTopic::EventQueue => "event_queue",
        EventTopic::Subscriptions => "subscriptions",
        EventTopic::All => "all",
    }
}

/// Record one kernel event.
pub fn record_event(event: &KernelEvent) {
    EVENT_BUS_MESSAGES
        .with_label_values(&[event.name(), topic_label(event.topic())])
        .inc();

    match event {
        KernelEvent::ModuleRegistered { .. } => REGISTERED_MODULES.inc(),
        KernelEvent::PermissionGranted { .. } => AUTHORITY_CHANGES.with_label_values(&["grant"]).inc(),
        KernelEvent::PermissionRevoked { .. } => AUTHORITY_CHANGES.with_label_values(&["revoke"]).inc(),
        KernelEvent::RoleGranted { .. } => AUTHORITY_CHANGES.with_label_values(&["role_grant"]).inc(),
        KernelEvent::RoleRevoked { .. } => AUTHORITY_CHANGES.with_label_values(&["role_revoke"]).inc(),
        KernelEvent::AccessValidated { .. } => ACCESS_VALIDATIONS.inc(),
        KernelEvent::EventEnqueued { queue_id, .. } => {
            QUEUE_EVENTS.with_label_values(&["enqueued"]).inc();
            QUEUE_DEPTH.with_label_values(&[&queue_id.to_string()]).inc();
        }
        KernelEvent::EventDequeued { .. } => QUEUE_EVENTS.with_label_values(&["dequeued"]).inc(),
        KernelEvent::EventReclaimed { .. } => QUEUE_EVENTS.with_label_values(&["reclaimed"]).inc(),
        KernelEvent::EventReleased { .. } => QUEUE_EVENTS.with_label_values(&["released"]).inc(),
        KernelEvent::EventProcessed { queue_id, .. } => {
            QUEUE_EVENTS.with_label_values(&["processed"]).inc();
            QUEUE_DEPTH.with_label_values(&[&queue_id.to_string()]).dec();
        }
        KernelEvent::QueueDeleted { queue_id } => {
            // Absent when the queue never held an event.
            let _ = QUEUE_DEPTH.remove_label_values(&[&queue_id.to_string()]);
        }
        KernelEvent::SubscribersNotified {
            event_type,
            subscribers,
            ..
        } => {
            NOTIFICATIONS
                .with_label_values(&[&event_type.to_string()])
                .inc_by(subscribers.len() as f64);
        }
        _ => {}
    }
}

/// Background task feeding [`record_event`] from the bus.
pub struct MetricsRecorder {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MetricsRecorder {
    /// Subscribe to every topic and start recording.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(bus: &InMemoryEventBus) -> Self {
        let mut stream = bus.event_stream(EventFilter::all());
        let task = tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                record_event(&event);
            }
            debug!("Metrics recorder stream closed");
        });
        info!("Metrics recorder subscribed to the kernel bus");
        Self {
            task: Mutex::new(Some(task)),
        }
    }

    /// Returns true while the recording task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stop recording.
    pub fn shutdown(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

impl Drop for MetricsRecorder {
    fn drop(&mut self) {
        self.shutdown();
    }
}
