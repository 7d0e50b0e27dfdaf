//! # ARK Kernel Runtime
//!
//! Wires the kernel subsystems together and exposes the call gateway.
//!
//! ## Modules
//!
//! - `container/` - configuration and the subsystem container
//! - `gateway` - resolve, permission-check and validate a module call
//! - `adapters/` - bus consumers (Prometheus metrics)
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`KernelConfig::from_env`)
//! 2. Initialize telemetry (`ark_telemetry::init_telemetry`)
//! 3. `KernelContainer::bootstrap`
//! 4. Route calls through `container.gateway`
//!
//! ```rust,ignore
//! let config = KernelConfig::from_env()?;
//! let _telemetry = ark_telemetry::init_telemetry(config.telemetry.clone())?;
//! let kernel = KernelContainer::bootstrap(config)?;
//! let implementation = kernel.gateway.authorize_call(caller, module, selector).await?;
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod container;
pub mod gateway;

pub use container::{ConfigError, KernelConfig, KernelContainer, PolicyKind};
pub use gateway::{GatewayError, KernelGateway};

#[cfg(test)]
mod tests {
    use super::*;
    use ark_01_module_registry::ModuleRegistryApi;
    use ark_02_module_authority::ModuleAuthorityApi;
    use ark_04_event_queue::{EventQueueApi, SYSTEM_QUEUE_ID};
    use shared_types::entities::{Address, Keycode, RoleId};
    use shared_types::security::AdminScope;

    const ADMIN: Address = Address::from_low_u16(0xAD);

    #[tokio::test]
    async fn test_bootstrap_wires_subsystems() {
        let mut config = KernelConfig::for_admin(ADMIN);
        config.roles.initial_roles = vec!["OPERATOR".to_string()];
        config.queue.system_queue_size = 8;

        let kernel = KernelContainer::bootstrap(config).unwrap();
        assert!(kernel.metrics.is_some());
        assert!(kernel.policy.is_authorized(&ADMIN, AdminScope::Registry));

        assert!(kernel.authority.role_exists(RoleId::of_name("OPERATOR")).await);

        let system = kernel.queues.get_queue(SYSTEM_QUEUE_ID).await.unwrap();
        assert_eq!(system.owner, ADMIN);
        assert_eq!(system.max_size, 8);

        kernel
            .registry
            .register(ADMIN, Keycode::from_leading_byte(0xA1), Address::from_low_u16(0x1111))
            .await
            .unwrap();
        assert_eq!(kernel.registry.module_count().await, 1);
        kernel.shutdown();
    }

    #[test]
    fn test_bootstrap_rejects_invalid_config() {
        let err = KernelContainer::bootstrap(KernelConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("invalid kernel configuration"));
    }

    #[test]
    fn test_metrics_need_runtime() {
        let config = KernelConfig::for_admin(ADMIN);
        assert!(KernelContainer::bootstrap(config.clone()).is_err());

        let mut quiet = config;
        quiet.telemetry.metrics_enabled = false;
        assert!(KernelContainer::bootstrap(quiet).is_ok());
    }

    #[test]
    fn test_scoped_policy_from_config() {
        let mut config = KernelConfig::for_admin(ADMIN);
        config.admin.policy = PolicyKind::Scoped;
        let registrar = Address::from_low_u16(0x77);
        config
            .admin
            .scoped
            .insert(AdminScope::Registry, vec![registrar]);

        let policy = container::build_policy(&config);
        assert!(policy.is_authorized(&registrar, AdminScope::Registry));
        assert!(!policy.is_authorized(&ADMIN, AdminScope::Registry));
        assert!(policy.is_authorized(&ADMIN, AdminScope::Authority));
    }
}
