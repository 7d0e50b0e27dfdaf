//! # Adapters
//!
//! Connect the kernel bus to infrastructure outside the subsystems.

pub mod metrics;

pub use metrics::{record_event, MetricsRecorder};
