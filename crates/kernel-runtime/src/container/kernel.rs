//! # Kernel Container
//!
//! Holds every subsystem instance and the shared infrastructure they are
//! wired onto.
//!
//! ## Initialization Order
//!
//! ```text
//! Phase 1: configuration validated, policy and event bus created
//! Phase 2: Registry, Authority, Validator (the call path)
//! Phase 3: Event Queue (system queue), Subscriptions
//! Phase 4: gateway over phase 2, metrics recorder on the bus
//! ```
//!
//! ## Thread Safety
//!
//! - All services wrapped in `Arc` for shared ownership
//! - Each service serializes its own mutations; there is no cross-service lock
//! - The event bus is the only channel between services and the runtime

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use ark_01_module_registry::ModuleRegistryService;
use ark_02_module_authority::{ModuleAuthorityService, ServiceConfig as AuthorityConfig};
use ark_03_access_validator::AccessValidatorService;
use ark_04_event_queue::{EventQueueService, ServiceConfig as QueueServiceConfig};
use ark_05_event_subscriptions::SubscriptionService;
use shared_bus::InMemoryEventBus;
use shared_types::security::{AdminSetPolicy, ScopedPolicy, SharedPolicy, SingleAdminPolicy};
use shared_types::time::{SystemTimeSource, TimeSource};

use crate::adapters::MetricsRecorder;
use crate::container::config::{KernelConfig, PolicyKind};
use crate::gateway::KernelGateway;

/// Every kernel subsystem, wired together.
pub struct KernelContainer {
    // =========================================================================
    // CALL PATH
    // =========================================================================
    /// Module Registry (Subsystem 1)
    pub registry: Arc<ModuleRegistryService>,

    /// Module Authority (Subsystem 2)
    pub authority: Arc<ModuleAuthorityService>,

    /// Module Access Validator (Subsystem 3)
    pub validator: Arc<AccessValidatorService>,

    /// Resolves and authorizes calls over the three above.
    pub gateway: KernelGateway,

    // =========================================================================
    // EVENT UTILITIES
    // =========================================================================
    /// Event Queue Manager (Subsystem 4)
    pub queues: Arc<EventQueueService>,

    /// Event Subscription Manager (Subsystem 5)
    pub subscriptions: Arc<SubscriptionService>,

    // =========================================================================
    // SHARED INFRASTRUCTURE
    // =========================================================================
    /// Every committed mutation is published here.
    pub event_bus: Arc<InMemoryEventBus>,

    /// The policy every admin-gated operation asks.
    pub policy: SharedPolicy,

    /// Present when metrics are enabled.
    pub metrics: Option<MetricsRecorder>,

    /// Kernel configuration (immutable after bootstrap).
    pub config: KernelConfig,
}

/// Build the authorization policy described by the configuration.
pub fn build_policy(config: &KernelConfig) -> SharedPolicy {
    let admins = config.admin.admins.iter().copied();
    match config.admin.policy {
        PolicyKind::Single => Arc::new(SingleAdminPolicy::new(config.primary_admin())),
        PolicyKind::AdminSet => Arc::new(AdminSetPolicy::new(admins)),
        PolicyKind::Scoped => Arc::new(
            config
                .admin
                .scoped
                .iter()
                .fold(ScopedPolicy::new(admins), |policy, (scope, set)| {
                    policy.with_scope(*scope, set.iter().copied())
                }),
        ),
    }
}

impl KernelContainer {
    /// Validate the configuration and build every subsystem on the wall clock.
    ///
    /// # Errors
    ///
    /// Invalid configuration, a system queue that cannot be created, or
    /// metrics enabled outside a tokio runtime.
    pub fn bootstrap(config: KernelConfig) -> Result<Self> {
        Self::bootstrap_with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Same as [`bootstrap`](Self::bootstrap) with an injected time source.
    ///
    /// # Errors
    ///
    /// See [`bootstrap`](Self::bootstrap).
    #[instrument(name = "kernel_init", skip_all)]
    pub fn bootstrap_with_clock(config: KernelConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        info!("Initializing ARK kernel container");

        // =====================================================================
        // PHASE 1: Shared Infrastructure
        // =====================================================================
        config.validate().context("invalid kernel configuration")?;

        let policy = build_policy(&config);
        let event_bus = Arc::new(InMemoryEventBus::with_capacity(config.bus.capacity));
        info!(
            policy = policy.name(),
            admins = config.admin.admins.len(),
            bus_capacity = config.bus.capacity,
            "Phase 1: policy and event bus ready"
        );

        // =====================================================================
        // PHASE 2: Call Path
        // =====================================================================
        let registry = Arc::new(ModuleRegistryService::new(
            policy.clone(),
            event_bus.clone(),
            clock.clone(),
        ));
        let authority = Arc::new(ModuleAuthorityService::new(
            AuthorityConfig {
                initial_roles: config.roles.role_ids(),
            },
            policy.clone(),
            event_bus.clone(),
        ));
        let validator = Arc::new(AccessValidatorService::new(
            policy.clone(),
            event_bus.clone(),
        ));
        info!(
            roles = config.roles.initial_roles.len(),
            "Phase 2: registry, authority and validator initialized"
        );

        // =====================================================================
        // PHASE 3: Event Utilities
        // =====================================================================
        let queues = Arc::new(
            EventQueueService::new(
                QueueServiceConfig {
                    system_owner: config.system_queue_owner(),
                    system_queue_size: config.queue.system_queue_size,
                    processing_timeout_ms: config.queue.processing_timeout_ms,
                },
                event_bus.clone(),
                clock.clone(),
            )
            .context("failed to create the system queue")?,
        );
        let subscriptions = Arc::new(SubscriptionService::new(
            policy.clone(),
            event_bus.clone(),
            clock,
        ));
        info!("Phase 3: event queue and subscriptions initialized");

        // =====================================================================
        // PHASE 4: Gateway and Metrics
        // =====================================================================
        let gateway = KernelGateway::new(registry.clone(), authority.clone(), validator.clone());

        let metrics = if config.telemetry.metrics_enabled {
            ark_telemetry::register_metrics().context("failed to register metrics")?;
            tokio::runtime::Handle::try_current()
                .context("metrics recording needs a tokio runtime")?;
            Some(MetricsRecorder::spawn(&event_bus))
        } else {
            None
        };
        info!(metrics = metrics.is_some(), "Phase 4: gateway ready");

        Ok(Self {
            registry,
            authority,
            validator,
            gateway,
            queues,
            subscriptions,
            event_bus,
            policy,
            metrics,
            config,
        })
    }

    /// Stop background tasks.
    pub fn shutdown(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.shutdown();
        }
        info!("ARK kernel container shut down");
    }
}
