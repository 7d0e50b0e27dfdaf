//! # ARK Telemetry
//!
//! Logging and metrics for the ARK kernel.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber`, compact for
//!   development or JSON for log shippers.
//! - **Metrics**: Prometheus collectors in a process-wide registry, exported
//!   as text with [`encode_metrics`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ark_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ARK_SERVICE_NAME` | `ark-kernel` | Service name in logs |
//! | `ARK_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `ARK_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `ARK_JSON_LOGS` | `false` | JSON formatted logs |
//! | `ARK_METRICS` | `true` | Register Prometheus collectors |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, LoggingHandle};
pub use metrics::{
    encode_metrics, record_error, register_metrics, HistogramTimer, MetricsHandle,
    ACCESS_VALIDATIONS, AUTHORITY_CHANGES, EVENT_BUS_MESSAGES, GATEWAY_CALLS, GATEWAY_DURATION,
    NOTIFICATIONS, QUEUE_DEPTH, QUEUE_EVENTS, REGISTERED_MODULES, SUBSYSTEM_ERRORS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    let logging = init_logging(&config)?;

    Ok(TelemetryGuard {
        _logging: logging,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logging: LoggingHandle,
    _metrics: Option<MetricsHandle>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}
