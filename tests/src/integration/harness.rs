//! # Test Harness
//!
//! Boots a full kernel on a [`ManualClock`] with metrics disabled, so tests
//! run without a Prometheus recorder and control time explicitly.
//! [`boot_recording`] keeps the recorder on for scenarios that read metrics.

use kernel_runtime::{KernelConfig, KernelContainer};
use shared_bus::{EventFilter, EventStream, KernelEvent, Subscription};
use shared_types::entities::Address;
use shared_types::time::ManualClock;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;

pub const ADMIN: Address = Address::from_low_u16(0xAD);
pub const START_MS: u64 = 1_700_000_000_000;

/// A bootstrapped kernel plus the clock driving it.
pub struct Kernel {
    pub container: KernelContainer,
    pub clock: Arc<ManualClock>,
}

impl Kernel {
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.container.event_bus.subscribe(filter)
    }

    pub fn stream(&self, filter: EventFilter) -> EventStream {
        self.container.event_bus.event_stream(filter)
    }
}

/// Boot a kernel administered by [`ADMIN`].
pub fn boot() -> Kernel {
    boot_with(KernelConfig::for_admin(ADMIN))
}

/// Boot a kernel from `config` with metrics switched off.
pub fn boot_with(mut config: KernelConfig) -> Kernel {
    config.telemetry.metrics_enabled = false;
    let clock = Arc::new(ManualClock::new(START_MS));
    let container = KernelContainer::bootstrap_with_clock(config, clock.clone())
        .expect("kernel bootstrap");
    Kernel { container, clock }
}

/// Boot a kernel with the metrics recorder running. Needs a tokio runtime.
pub fn boot_recording() -> Kernel {
    let mut config = KernelConfig::for_admin(ADMIN);
    config.telemetry.metrics_enabled = true;
    let clock = Arc::new(ManualClock::new(START_MS));
    let container = KernelContainer::bootstrap_with_clock(config, clock.clone())
        .expect("kernel bootstrap");
    Kernel { container, clock }
}

/// Receive the next event or fail after a short wait.
pub async fn next_event(sub: &mut Subscription) -> KernelEvent {
    tokio::time::timeout(Duration::from_millis(200), sub.recv())
        .await
        .expect("timed out waiting for a kernel event")
        .expect("bus closed")
}

/// Pull `count` events off a stream, failing if any takes too long.
pub async fn take_events(stream: &mut EventStream, count: usize) -> Vec<KernelEvent> {
    let mut events = Vec::with_capacity(count);
    while events.len() < count {
        let event = tokio::time::timeout(Duration::from_millis(200), stream.next())
            .await
            .expect("timed out waiting for a kernel event")
            .expect("bus closed");
        events.push(event);
    }
    events
}
