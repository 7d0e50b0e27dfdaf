//! Prometheus metrics for the ARK kernel.
//!
//! All metrics follow the naming convention: `ark_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts,
    Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // GATEWAY METRICS
    // =========================================================================

    /// Calls routed through the kernel gateway by outcome.
    pub static ref GATEWAY_CALLS: CounterVec = CounterVec::new(
        Opts::new("ark_gateway_calls_total", "Calls authorized through the kernel gateway"),
        &["outcome"]  // routed, or the refusal kind: not_registered / permission_denied / access_rejected
    ).expect("metric creation failed");

    /// Gateway authorization duration.
    pub static ref GATEWAY_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ark_gateway_authorize_duration_seconds",
            "Time spent resolving and authorizing a call"
        ).buckets(exponential_buckets(0.00001, 2.0, 15).expect("bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // REGISTRY / AUTHORITY / VALIDATOR METRICS
    // =========================================================================

    /// Registered modules.
    pub static ref REGISTERED_MODULES: Gauge = Gauge::new(
        "ark_registry_modules",
        "Number of modules in the registry"
    ).expect("metric creation failed");

    /// Permission and role changes.
    pub static ref AUTHORITY_CHANGES: CounterVec = CounterVec::new(
        Opts::new("ark_authority_changes_total", "Permission and role changes"),
        &["change"]  // grant / revoke / role_grant / role_revoke
    ).expect("metric creation failed");

    /// Access validations performed.
    pub static ref ACCESS_VALIDATIONS: Counter = Counter::new(
        "ark_validator_validations_total",
        "Total access validations performed"
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT QUEUE METRICS
    // =========================================================================

    /// Queue event lifecycle transitions.
    pub static ref QUEUE_EVENTS: CounterVec = CounterVec::new(
        Opts::new("ark_queue_events_total", "Queue event transitions"),
        &["action"]  // enqueued / dequeued / processed / reclaimed / released
    ).expect("metric creation failed");

    /// Events currently held per queue.
    pub static ref QUEUE_DEPTH: GaugeVec = GaugeVec::new(
        Opts::new("ark_queue_depth", "Events currently held in a queue"),
        &["queue_id"]
    ).expect("metric creation failed");

    // =========================================================================
    // SUBSCRIPTION METRICS
    // =========================================================================

    /// Notifications fanned out to subscribers.
    pub static ref NOTIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("ark_subscriptions_notifications_total", "Subscriber notifications"),
        &["event_type"]
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS METRICS
    // =========================================================================

    /// Kernel events observed on the bus.
    pub static ref EVENT_BUS_MESSAGES: CounterVec = CounterVec::new(
        Opts::new("ark_eventbus_messages_total", "Kernel events observed on the bus"),
        &["event", "topic"]
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Rejected calls by subsystem and error kind.
    pub static ref SUBSYSTEM_ERRORS: CounterVec = CounterVec::new(
        Opts::new("ark_subsystem_errors_total", "Errors by subsystem and type"),
        &["subsystem", "error_type"]
    ).expect("metric creation failed");
}

/// Handle proving the collectors are registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors this call registered.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; collectors already present are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Gateway
        Box::new(GATEWAY_CALLS.clone()),
        Box::new(GATEWAY_DURATION.clone()),
        // Registry / authority / validator
        Box::new(REGISTERED_MODULES.clone()),
        Box::new(AUTHORITY_CHANGES.clone()),
        Box::new(ACCESS_VALIDATIONS.clone()),
        // Queues
        Box::new(QUEUE_EVENTS.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        // Subscriptions
        Box::new(NOTIFICATIONS.clone()),
        // Event Bus
        Box::new(EVENT_BUS_MESSAGES.clone()),
        // Errors
        Box::new(SUBSYSTEM_ERRORS.clone()),
    ];

    let mut registered = 0;
    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) => registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record a rejected call.
pub fn record_error(subsystem: &str, error_type: &str) {
    SUBSYSTEM_ERRORS
        .with_label_values(&[subsystem, error_type])
        .inc();
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
